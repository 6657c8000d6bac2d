//! `DynamoDB` implementation of [`TableBackend`]

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    operation::transact_write_items::TransactWriteItemsError,
    types::{AttributeValue, Put, TransactWriteItem},
    Client as DynamoDbClient,
};

use super::{
    classify_cancellation_codes, ConditionalPut, ContinuationToken, IndexQuery, Item, Page,
    PutCondition, StoreError, StoreResult, TableBackend,
};
use crate::config::TableConfig;
use crate::keys::{TableAttribute, TableKey};

/// Condition expression guarding creates
const KEY_ABSENT_CONDITION: &str = "attribute_not_exists(#pk)";

/// Table backend talking to `DynamoDB`
pub struct DynamoDbBackend {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl DynamoDbBackend {
    /// Creates a new backend
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `config` - Table configuration resolved at startup
    #[must_use]
    pub fn new(dynamodb_client: Arc<DynamoDbClient>, config: &TableConfig) -> Self {
        Self {
            dynamodb_client,
            table_name: config.table_name().to_string(),
        }
    }

    /// Name of the table this backend writes to
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Builds one transaction entry for a conditional put
    fn build_transact_put(&self, put: ConditionalPut) -> StoreResult<TransactWriteItem> {
        let ConditionalPut {
            item, condition, ..
        } = put;

        let mut builder = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item));
        if condition == PutCondition::KeyAbsent {
            builder = builder
                .condition_expression(KEY_ABSENT_CONDITION)
                .expression_attribute_names("#pk", TableAttribute::PartitionKey.to_string());
        }

        let put = builder.build().map_err(|e| {
            StoreError::SerializationError(format!("Failed to build transact put: {e:?}"))
        })?;

        Ok(TransactWriteItem::builder().put(put).build())
    }
}

#[async_trait]
impl TableBackend for DynamoDbBackend {
    async fn put_item(&self, put: ConditionalPut) -> StoreResult<()> {
        let ConditionalPut {
            item, condition, ..
        } = put;

        let mut request = self
            .dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item));
        if condition == PutCondition::KeyAbsent {
            request = request
                .condition_expression(KEY_ABSENT_CONDITION)
                .expression_attribute_names("#pk", TableAttribute::PartitionKey.to_string());
        }

        request.send().await.map_err(|err| {
            if matches!(
                err,
                SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
            ) {
                StoreError::AlreadyExists
            } else {
                StoreError::unavailable("put item", &err)
            }
        })?;

        Ok(())
    }

    async fn transact_put_items(&self, puts: Vec<ConditionalPut>) -> StoreResult<()> {
        let transact_items = puts
            .into_iter()
            .map(|put| self.build_transact_put(put))
            .collect::<StoreResult<Vec<_>>>()?;

        self.dynamodb_client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
            .map_err(|err| {
                if let Some(TransactWriteItemsError::TransactionCanceledException(cancelled)) =
                    err.as_service_error()
                {
                    let reasons = classify_cancellation_codes(
                        cancelled
                            .cancellation_reasons()
                            .iter()
                            .map(|reason| reason.code()),
                    );
                    return StoreError::TransactionCancelled { reasons };
                }
                StoreError::unavailable("transact write items", &err)
            })?;

        Ok(())
    }

    async fn get_item(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                TableAttribute::PartitionKey.to_string(),
                AttributeValue::S(key.pk.clone()),
            )
            .key(
                TableAttribute::SortKey.to_string(),
                AttributeValue::S(key.sk.clone()),
            )
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| StoreError::unavailable("get item", &err))?;

        Ok(response.item().cloned())
    }

    async fn query(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
        limit: Option<u32>,
    ) -> StoreResult<Page<Item>> {
        let (partition_attribute, sort_attribute) = query.key_attributes();

        let mut request = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .set_index_name(query.index.map(|index| index.to_string()))
            .expression_attribute_names("#pk", partition_attribute.to_string())
            .expression_attribute_values(":pk", AttributeValue::S(query.partition.clone()))
            .set_exclusive_start_key(start.map(ContinuationToken::into_item_key))
            .set_limit(limit.and_then(|limit| i32::try_from(limit).ok()));

        request = match &query.sort_prefix {
            Some(prefix) => request
                .key_condition_expression("#pk = :pk AND begins_with(#sk, :sk)")
                .expression_attribute_names("#sk", sort_attribute.to_string())
                .expression_attribute_values(":sk", AttributeValue::S(prefix.clone())),
            None => request.key_condition_expression("#pk = :pk"),
        };

        let response = request
            .send()
            .await
            .map_err(|err| StoreError::unavailable("query", &err))?;

        let next = response
            .last_evaluated_key()
            .map(ContinuationToken::from_item_key)
            .transpose()?;

        Ok(Page {
            items: response.items().to_vec(),
            next,
        })
    }
}
