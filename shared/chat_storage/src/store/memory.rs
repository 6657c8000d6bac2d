//! In-memory [`TableBackend`] reproducing the `DynamoDB` behaviour the store
//! relies on: conditional puts, all-or-nothing transactions with ordered
//! cancellation reasons, `begins_with` key conditions, sort-key ordering and
//! pagination.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use super::{
    CancellationReason, ConditionalPut, ContinuationToken, IndexQuery, Item, Page, PutCondition,
    StoreError, StoreResult, TableBackend,
};
use crate::keys::{TableAttribute, TableKey};

/// `DynamoDB` limit on items per transaction
const MAX_TRANSACTION_ITEMS: usize = 100;

/// Position of an item within a query: sort value, then primary key
type QueryPosition = (String, TableKey);

/// Table kept in process memory
#[derive(Default)]
pub struct InMemoryBackend {
    items: RwLock<BTreeMap<TableKey, Item>>,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the service were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored items
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the table holds no items
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "ServiceUnavailable: in-memory table switched off".to_string(),
            ));
        }
        Ok(())
    }
}

fn string_attribute(item: &Item, attribute: TableAttribute) -> Option<&str> {
    item.get(&attribute.to_string())
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
}

/// Where a previous page stopped
fn token_position(
    token: &ContinuationToken,
    sort_attribute: TableAttribute,
) -> StoreResult<QueryPosition> {
    let attribute = |name| {
        token
            .attribute(name)
            .map(ToString::to_string)
            .ok_or(StoreError::InvalidContinuationToken)
    };

    Ok((
        attribute(sort_attribute)?,
        TableKey::new(
            attribute(TableAttribute::PartitionKey)?,
            attribute(TableAttribute::SortKey)?,
        ),
    ))
}

/// Last evaluated key for an item: primary key plus the queried key attributes
fn token_for(item: &Item, query: &IndexQuery) -> StoreResult<ContinuationToken> {
    let (partition_attribute, sort_attribute) = query.key_attributes();
    let key: Item = [
        TableAttribute::PartitionKey,
        TableAttribute::SortKey,
        partition_attribute,
        sort_attribute,
    ]
    .into_iter()
    .filter_map(|attribute| {
        string_attribute(item, attribute)
            .map(|value| (attribute.to_string(), AttributeValue::S(value.to_string())))
    })
    .collect();

    ContinuationToken::from_item_key(&key)
}

#[async_trait]
impl TableBackend for InMemoryBackend {
    async fn put_item(&self, put: ConditionalPut) -> StoreResult<()> {
        self.check_available()?;

        let mut items = self.items.write().await;
        if put.condition == PutCondition::KeyAbsent && items.contains_key(&put.key) {
            return Err(StoreError::AlreadyExists);
        }
        items.insert(put.key, put.item);

        Ok(())
    }

    async fn transact_put_items(&self, puts: Vec<ConditionalPut>) -> StoreResult<()> {
        self.check_available()?;

        if puts.is_empty() || puts.len() > MAX_TRANSACTION_ITEMS {
            return Err(StoreError::Unavailable(format!(
                "ValidationException: transaction must contain 1 to {MAX_TRANSACTION_ITEMS} items"
            )));
        }
        {
            let mut seen = HashSet::new();
            if !puts.iter().all(|put| seen.insert(&put.key)) {
                return Err(StoreError::Unavailable(
                    "ValidationException: multiple operations on one item".to_string(),
                ));
            }
        }

        let mut items = self.items.write().await;
        let reasons: Vec<CancellationReason> = puts
            .iter()
            .map(|put| {
                if put.condition == PutCondition::KeyAbsent && items.contains_key(&put.key) {
                    CancellationReason::ConditionalCheckFailed
                } else {
                    CancellationReason::None
                }
            })
            .collect();

        if reasons.iter().any(CancellationReason::is_condition_failure) {
            return Err(StoreError::TransactionCancelled { reasons });
        }

        for put in puts {
            items.insert(put.key, put.item);
        }

        Ok(())
    }

    async fn get_item(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        self.check_available()?;

        Ok(self.items.read().await.get(key).cloned())
    }

    async fn query(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
        limit: Option<u32>,
    ) -> StoreResult<Page<Item>> {
        self.check_available()?;

        if limit == Some(0) {
            return Err(StoreError::Unavailable(
                "ValidationException: limit must be greater than or equal to 1".to_string(),
            ));
        }

        let (partition_attribute, sort_attribute) = query.key_attributes();
        let after = start
            .map(|token| token_position(&token, sort_attribute))
            .transpose()?;

        let items = self.items.read().await;
        let mut matching: Vec<(QueryPosition, &Item)> = items
            .iter()
            .filter_map(|(key, item)| {
                if string_attribute(item, partition_attribute)? != query.partition {
                    return None;
                }
                let sort = string_attribute(item, sort_attribute)?;
                if let Some(prefix) = &query.sort_prefix {
                    if !sort.starts_with(prefix.as_str()) {
                        return None;
                    }
                }
                Some(((sort.to_string(), key.clone()), item))
            })
            .filter(|(position, _)| after.as_ref().map_or(true, |after| position > after))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));

        let limit = limit.map_or(usize::MAX, |limit| {
            usize::try_from(limit).unwrap_or(usize::MAX)
        });
        let has_more = matching.len() > limit;
        matching.truncate(limit);

        let next = match matching.last() {
            Some((_, item)) if has_more => Some(token_for(item, query)?),
            _ => None,
        };

        Ok(Page {
            items: matching.into_iter().map(|(_, item)| item.clone()).collect(),
            next,
        })
    }
}
