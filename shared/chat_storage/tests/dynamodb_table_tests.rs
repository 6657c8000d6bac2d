//! Store tests against `DynamoDB` on `LocalStack`
//!
//! Run with `cargo test -- --ignored` while `LocalStack` listens on port 4566.

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chat_storage::{
    config::TableConfig,
    entity::{GroupCreateRequest, MembershipCreateRequest, MessageCreateRequest, UserCreateRequest},
    groups::GroupStorage,
    keys::{TableAttribute, TableIndex},
    messages::MessageStorage,
    queries::AccessPatterns,
    registration::{RegistrationError, UserStorage},
    store::{DynamoDbBackend, SingleTableStore},
};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use tokio::time::sleep;
use uuid::Uuid;

/// Test configuration for LocalStack
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "us-east-1";

/// Test context that automatically cleans up the table on drop
struct TestContext {
    users: UserStorage,
    groups: GroupStorage,
    messages: MessageStorage,
    queries: AccessPatterns,
    table_name: String,
    dynamodb_client: Arc<DynamoDbClient>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let client = self.dynamodb_client.clone();
        let table = self.table_name.clone();

        let handle = tokio::runtime::Handle::try_current();
        if let Ok(handle) = handle {
            handle.spawn(async move {
                let _ = client.delete_table().table_name(&table).send().await;
            });
        }
    }
}

fn string_attribute(attribute: TableAttribute) -> AttributeDefinition {
    AttributeDefinition::builder()
        .attribute_name(attribute.to_string())
        .attribute_type(ScalarAttributeType::S)
        .build()
        .expect("Failed to build attribute definition")
}

fn key_element(attribute: TableAttribute, key_type: KeyType) -> KeySchemaElement {
    KeySchemaElement::builder()
        .attribute_name(attribute.to_string())
        .key_type(key_type)
        .build()
        .expect("Failed to build key schema")
}

fn global_index(index: TableIndex) -> GlobalSecondaryIndex {
    let (partition, sort) = index.key_attributes();

    GlobalSecondaryIndex::builder()
        .index_name(index.to_string())
        .key_schema(key_element(partition, KeyType::Hash))
        .key_schema(key_element(sort, KeyType::Range))
        .projection(
            Projection::builder()
                .projection_type(ProjectionType::All)
                .build(),
        )
        .build()
        .expect("Failed to build GSI")
}

/// Creates a test setup with a unique table
async fn setup_test() -> TestContext {
    let table_name = format!("test-group-chat-{}", Uuid::new_v4());

    let credentials = Credentials::from_keys(
        "test", // AWS_ACCESS_KEY_ID
        "test", // AWS_SECRET_ACCESS_KEY
        None,   // no session token
    );
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(credentials)
        .load()
        .await;

    let dynamodb_client = Arc::new(DynamoDbClient::new(&config));

    let mut create_table = dynamodb_client
        .create_table()
        .table_name(&table_name)
        .billing_mode(BillingMode::PayPerRequest)
        .key_schema(key_element(TableAttribute::PartitionKey, KeyType::Hash))
        .key_schema(key_element(TableAttribute::SortKey, KeyType::Range))
        .global_secondary_indexes(global_index(TableIndex::GroupsByCreator))
        .global_secondary_indexes(global_index(TableIndex::MessagesByGroup));
    for attribute in [
        TableAttribute::PartitionKey,
        TableAttribute::SortKey,
        TableAttribute::Gsi1PartitionKey,
        TableAttribute::Gsi1SortKey,
        TableAttribute::Gsi2PartitionKey,
        TableAttribute::Gsi2SortKey,
    ] {
        create_table = create_table.attribute_definitions(string_attribute(attribute));
    }
    create_table
        .send()
        .await
        .expect("Failed to create test table");

    // Wait for table to be ready
    sleep(Duration::from_millis(100)).await;

    let backend = DynamoDbBackend::new(
        dynamodb_client.clone(),
        &TableConfig::new(Some(table_name.clone())),
    );
    let store = Arc::new(SingleTableStore::new(Arc::new(backend)));

    TestContext {
        users: UserStorage::new(store.clone()),
        groups: GroupStorage::new(store.clone()),
        messages: MessageStorage::new(store.clone()),
        queries: AccessPatterns::new(store),
        table_name,
        dynamodb_client,
    }
}

fn user_request(username: &str, email: &str) -> UserCreateRequest {
    UserCreateRequest {
        username: username.to_string(),
        email: email.to_string(),
        profile_picture: None,
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_registration_uniqueness() {
    let ctx = setup_test().await;

    let user = ctx
        .users
        .register_user(user_request("bob", "b@x.com"))
        .await
        .expect("Failed to register user");
    assert_eq!(ctx.users.get_user("bob").await.unwrap(), Some(user));

    let same_username = ctx
        .users
        .register_user(user_request("bob", "other@x.com"))
        .await;
    assert!(matches!(same_username, Err(RegistrationError::UsernameTaken)));

    let same_email = ctx
        .users
        .register_user(user_request("carol", "b@x.com"))
        .await;
    assert!(matches!(same_email, Err(RegistrationError::EmailTaken)));
    assert_eq!(ctx.users.get_user("carol").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_groups_and_memberships() {
    let ctx = setup_test().await;

    let group = ctx
        .groups
        .create_group(GroupCreateRequest {
            user_id: "alice".to_string(),
            name: "Rustaceans".to_string(),
            group_profile_pic: None,
            description: None,
        })
        .await
        .expect("Failed to create group");

    let join = MembershipCreateRequest {
        group_id: group.id.clone(),
        user_id: "bob".to_string(),
    };
    assert!(ctx.groups.add_user_to_group(join.clone()).await.unwrap());
    assert!(!ctx.groups.add_user_to_group(join).await.unwrap());

    let created: Vec<_> = ctx
        .queries
        .groups_created_by("alice")
        .try_collect()
        .await
        .unwrap();
    assert_eq!(created, vec![group.clone()]);

    let member_of = ctx.queries.groups_user_belongs_to("bob").await.unwrap();
    assert_eq!(member_of.len(), 1);
    assert_eq!(member_of[0].group.as_ref(), Some(&group));
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_message_pagination() {
    let ctx = setup_test().await;

    let mut expected = Vec::new();
    for i in 0..3 {
        expected.push(
            ctx.messages
                .send_message(MessageCreateRequest {
                    group_id: "g1".to_string(),
                    user_id: "alice".to_string(),
                    message_text: format!("hello {i}"),
                })
                .await
                .unwrap(),
        );
    }

    let first = ctx
        .queries
        .messages_in_group_page("g1", Some(2), None)
        .await
        .unwrap();
    assert_eq!(first.items, expected[..2]);

    let rest = ctx
        .queries
        .messages_in_group_page("g1", None, first.next)
        .await
        .unwrap();
    assert_eq!(rest.items, expected[2..]);
}
