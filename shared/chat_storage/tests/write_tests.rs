mod common;

use chat_storage::{
    entity::{MembershipCreateRequest, MembershipRecord, TypingIndicatorRequest},
    keys::membership_key,
    store::StoreError,
};
use common::{group_request, message_request, setup_test};
use pretty_assertions::assert_eq;

fn membership(group_id: &str, user_id: &str) -> MembershipCreateRequest {
    MembershipCreateRequest {
        group_id: group_id.to_string(),
        user_id: user_id.to_string(),
    }
}

fn typing(group_id: &str, user_id: &str, typing: bool) -> TypingIndicatorRequest {
    TypingIndicatorRequest {
        group_id: group_id.to_string(),
        user_id: user_id.to_string(),
        typing,
    }
}

#[tokio::test]
async fn test_create_group() {
    let ctx = setup_test();

    let group = ctx
        .groups
        .create_group(group_request("alice", "Rustaceans"))
        .await
        .expect("Failed to create group");

    assert_eq!(group.user_id, "alice");
    assert_eq!(group.name, "Rustaceans");
    assert_eq!(group.description.as_deref(), Some("Rustaceans description"));
    assert_eq!(ctx.groups.get_group(&group.id).await.unwrap(), Some(group));
}

#[tokio::test]
async fn test_add_user_to_group_only_once() {
    let ctx = setup_test();

    assert!(ctx
        .groups
        .add_user_to_group(membership("g1", "bob"))
        .await
        .unwrap());
    let first = ctx
        .store
        .get_by_key::<MembershipRecord>(&membership_key("g1", "bob"))
        .await
        .unwrap()
        .expect("Membership should exist");

    assert!(!ctx
        .groups
        .add_user_to_group(membership("g1", "bob"))
        .await
        .unwrap());
    let after = ctx
        .store
        .get_by_key::<MembershipRecord>(&membership_key("g1", "bob"))
        .await
        .unwrap()
        .expect("Membership should still exist");

    assert_eq!(after, first);
    assert_eq!(ctx.backend.len().await, 1);
}

#[tokio::test]
async fn test_add_user_to_group_propagates_backend_failure() {
    let ctx = setup_test();
    ctx.backend.set_unavailable(true);

    let result = ctx.groups.add_user_to_group(membership("g1", "bob")).await;

    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_send_message() {
    let ctx = setup_test();

    let message = ctx
        .messages
        .send_message(message_request("g1", "alice", "hello"))
        .await
        .expect("Failed to send message");

    assert_eq!(message.group_id, "g1");
    assert_eq!(message.user_id, "alice");
    assert_eq!(message.message_text, "hello");
    assert!(message.created_on > 0);
}

#[tokio::test]
async fn test_typing_indicator_last_write_wins() {
    let ctx = setup_test();

    assert!(ctx
        .messages
        .set_typing(typing("g1", "alice", true))
        .await
        .unwrap());
    assert!(!ctx
        .messages
        .set_typing(typing("g1", "alice", false))
        .await
        .unwrap());

    let state = ctx
        .messages
        .get_typing("alice", "g1")
        .await
        .unwrap()
        .expect("Typing state should exist");
    assert!(!state.typing);
    assert_eq!(ctx.backend.len().await, 1);

    ctx.messages
        .set_typing(typing("g2", "alice", true))
        .await
        .unwrap();
    assert_eq!(ctx.backend.len().await, 2);
}
