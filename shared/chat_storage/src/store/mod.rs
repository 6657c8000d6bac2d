//! Single-table store
//!
//! [`SingleTableStore`] is the typed surface the rest of the crate uses: put,
//! conditional put, all-or-nothing transactional put, get by key and
//! index queries. It delegates to a [`TableBackend`], which is either the
//! `DynamoDB` client or, in tests, an in-memory table with the same semantics.

mod dynamodb;
mod error;
#[cfg(any(test, feature = "test-utils"))]
mod memory;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::entity::Record;
use crate::keys::{TableAttribute, TableIndex, TableKey};

pub use dynamodb::DynamoDbBackend;
pub use error::{classify_cancellation_codes, CancellationReason, StoreError, StoreResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryBackend;

/// A raw `DynamoDB` item
pub type Item = HashMap<String, AttributeValue>;

/// Precondition attached to a put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Write unconditionally, replacing any existing item
    Overwrite,
    /// Write only if no item with the same primary key exists
    KeyAbsent,
}

/// A serialized put together with its precondition
#[derive(Debug, Clone)]
pub struct ConditionalPut {
    /// Primary key of the item
    pub key: TableKey,
    /// Serialized item, key attributes included
    pub item: Item,
    /// Precondition checked by the backend
    pub condition: PutCondition,
}

impl ConditionalPut {
    /// Serializes a record with the given precondition
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SerializationError` if the record cannot be
    /// converted into an item
    pub fn new<R: Record>(record: &R, condition: PutCondition) -> StoreResult<Self> {
        Ok(Self {
            key: record.table_key(),
            item: serde_dynamo::to_item(record)?,
            condition,
        })
    }

    /// Put that fails if the record's key already exists
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SerializationError` if the record cannot be
    /// converted into an item
    pub fn if_absent<R: Record>(record: &R) -> StoreResult<Self> {
        Self::new(record, PutCondition::KeyAbsent)
    }

    /// Put that replaces any existing item
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SerializationError` if the record cannot be
    /// converted into an item
    pub fn overwrite<R: Record>(record: &R) -> StoreResult<Self> {
        Self::new(record, PutCondition::Overwrite)
    }
}

/// Key condition for a query: partition equality plus optional sort prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    /// Secondary index to query, or `None` for the table's primary key
    pub index: Option<TableIndex>,
    /// Partition key value
    pub partition: String,
    /// Optional `begins_with` condition on the sort key
    pub sort_prefix: Option<String>,
}

impl IndexQuery {
    /// Query against a secondary index
    pub fn on_index(
        index: TableIndex,
        partition: impl Into<String>,
        sort_prefix: Option<&str>,
    ) -> Self {
        Self {
            index: Some(index),
            partition: partition.into(),
            sort_prefix: sort_prefix.map(ToString::to_string),
        }
    }

    /// Query against the table's primary key
    pub fn on_table(partition: impl Into<String>, sort_prefix: Option<&str>) -> Self {
        Self {
            index: None,
            partition: partition.into(),
            sort_prefix: sort_prefix.map(ToString::to_string),
        }
    }

    /// Partition and sort key attributes this query runs against
    #[must_use]
    pub const fn key_attributes(&self) -> (TableAttribute, TableAttribute) {
        match self.index {
            Some(index) => index.key_attributes(),
            None => (TableAttribute::PartitionKey, TableAttribute::SortKey),
        }
    }
}

/// Opaque position from which a query can be resumed
///
/// Wraps the backend's last evaluated key. Every key attribute of this table
/// is a string, so the token is a flat string map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(BTreeMap<String, String>);

impl ContinuationToken {
    /// Builds a token from a backend key
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SerializationError` if a key attribute is not a string
    pub fn from_item_key(key: &Item) -> StoreResult<Self> {
        key.iter()
            .map(|(name, value)| {
                value
                    .as_s()
                    .map(|s| (name.clone(), s.clone()))
                    .map_err(|_| {
                        StoreError::SerializationError(format!(
                            "Key attribute {name} is not a string"
                        ))
                    })
            })
            .collect::<StoreResult<BTreeMap<_, _>>>()
            .map(Self)
    }

    /// Converts the token back into a backend key
    #[must_use]
    pub fn into_item_key(self) -> Item {
        self.0
            .into_iter()
            .map(|(name, value)| (name, AttributeValue::S(value)))
            .collect()
    }

    /// Value of one key attribute
    #[must_use]
    pub fn attribute(&self, attribute: TableAttribute) -> Option<&str> {
        self.0.get(&attribute.to_string()).map(String::as_str)
    }

    /// Encodes the token for API callers
    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(&self.0).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a token previously produced by [`Self::encode`]
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidContinuationToken` for malformed input
    pub fn decode(token: &str) -> StoreResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StoreError::InvalidContinuationToken)?;
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|_| StoreError::InvalidContinuationToken)
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in sort-key order
    pub items: Vec<T>,
    /// Position to resume from, `None` when the query is exhausted
    pub next: Option<ContinuationToken>,
}

impl<T> Page<T> {
    /// Maps every item of the page
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}

/// Transactional key-value backend holding the table
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Writes one item, honouring its precondition
    ///
    /// Fails with `StoreError::AlreadyExists` when a `KeyAbsent` condition
    /// does not hold.
    async fn put_item(&self, put: ConditionalPut) -> StoreResult<()>;

    /// Writes all items or none
    ///
    /// Fails with `StoreError::TransactionCancelled` carrying one reason per
    /// item, in submission order, when any precondition does not hold.
    async fn transact_put_items(&self, puts: Vec<ConditionalPut>) -> StoreResult<()>;

    /// Reads one item by primary key
    async fn get_item(&self, key: &TableKey) -> StoreResult<Option<Item>>;

    /// Reads one page of items matching the key condition, in sort-key order
    async fn query(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
        limit: Option<u32>,
    ) -> StoreResult<Page<Item>>;
}

/// Typed access to the single table
#[derive(Clone)]
pub struct SingleTableStore {
    backend: Arc<dyn TableBackend>,
}

impl SingleTableStore {
    /// Creates a store over the given backend
    #[must_use]
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    /// Writes a record, replacing any existing item with the same key
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or the backend call fails
    pub async fn put<R: Record>(&self, record: &R) -> StoreResult<()> {
        self.backend.put_item(ConditionalPut::overwrite(record)?).await
    }

    /// Writes a record only if its key is not yet taken
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the key exists, or another
    /// `StoreError` if serialization or the backend call fails
    pub async fn put_if_absent<R: Record>(&self, record: &R) -> StoreResult<()> {
        self.backend.put_item(ConditionalPut::if_absent(record)?).await
    }

    /// Applies all puts atomically
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TransactionCancelled` with per-item reasons if any
    /// precondition fails; nothing is written in that case
    pub async fn transact_put(&self, puts: Vec<ConditionalPut>) -> StoreResult<()> {
        self.backend.transact_put_items(puts).await
    }

    /// Reads a record by primary key
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails or the stored item is
    /// not a well-formed `R`
    pub async fn get_by_key<R: Record>(&self, key: &TableKey) -> StoreResult<Option<R>> {
        self.backend
            .get_item(key)
            .await?
            .map(decode_item::<R>)
            .transpose()
    }

    /// Reads one page of records from a query
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend call fails or an item is not a
    /// well-formed `R`
    pub async fn query_page<R: Record>(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
        limit: Option<u32>,
    ) -> StoreResult<Page<R>> {
        let page = self.backend.query(query, start, limit).await?;
        let items = page
            .items
            .into_iter()
            .map(decode_item::<R>)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page {
            items,
            next: page.next,
        })
    }

    /// Lazily streams every record matching a query, page by page
    ///
    /// Starts from `start` when given, so an interrupted listing can be
    /// resumed from a previously returned token.
    pub fn query_by_index<R: Record>(
        &self,
        query: IndexQuery,
        start: Option<ContinuationToken>,
    ) -> BoxStream<'_, StoreResult<R>> {
        stream::try_unfold(Some(start), move |cursor| {
            let query = query.clone();
            async move {
                let Some(start) = cursor else {
                    return Ok(None);
                };
                let page = self.query_page::<R>(&query, start, None).await?;
                let next = page.next.map(Some);
                let items = stream::iter(page.items.into_iter().map(Ok::<R, StoreError>));
                Ok::<_, StoreError>(Some((items, next)))
            }
        })
        .try_flatten()
        .boxed()
    }
}

/// Deserializes an item, checking its `ENTITY` tag
fn decode_item<R: Record>(item: Item) -> StoreResult<R> {
    let entity = TableAttribute::Entity.to_string();
    let tag = item.get(&entity).and_then(|value| value.as_s().ok());
    if tag.map(String::as_str) != Some(R::ENTITY.to_string().as_str()) {
        return Err(StoreError::SerializationError(format!(
            "Expected {} item, found {tag:?}",
            R::ENTITY
        )));
    }

    Ok(serde_dynamo::from_item(item)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_token_encoding() {
        let key: Item = HashMap::from([
            ("PK".to_string(), AttributeValue::S("MESSAGE#m1".to_string())),
            ("GSI2PK".to_string(), AttributeValue::S("GROUP#g1".to_string())),
        ]);
        let token = ContinuationToken::from_item_key(&key).unwrap();

        let decoded = ContinuationToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(decoded.attribute(TableAttribute::Gsi2PartitionKey), Some("GROUP#g1"));
        assert_eq!(decoded.into_item_key(), key);
    }

    #[test]
    fn test_continuation_token_rejects_garbage() {
        assert!(matches!(
            ContinuationToken::decode("not a token!"),
            Err(StoreError::InvalidContinuationToken)
        ));
        assert!(matches!(
            ContinuationToken::decode(&URL_SAFE_NO_PAD.encode(b"[1,2]")),
            Err(StoreError::InvalidContinuationToken)
        ));
    }

    #[test]
    fn test_continuation_token_requires_string_keys() {
        let key: Item = HashMap::from([("PK".to_string(), AttributeValue::N("1".to_string()))]);
        assert!(matches!(
            ContinuationToken::from_item_key(&key),
            Err(StoreError::SerializationError(_))
        ));
    }

    #[test]
    fn test_query_key_attributes() {
        let on_table = IndexQuery::on_table("USER#alice", None);
        assert_eq!(
            on_table.key_attributes(),
            (TableAttribute::PartitionKey, TableAttribute::SortKey)
        );

        let on_index = IndexQuery::on_index(TableIndex::MessagesByGroup, "GROUP#g1", None);
        assert_eq!(
            on_index.key_attributes(),
            (TableAttribute::Gsi2PartitionKey, TableAttribute::Gsi2SortKey)
        );
    }
}
