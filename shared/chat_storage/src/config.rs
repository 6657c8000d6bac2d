//! Table configuration injected at startup

/// Table used when no name is configured
pub const DEFAULT_TABLE_NAME: &str = "groupChatDynamoDBTable";

/// Configuration of the group chat table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    table_name: String,
}

impl TableConfig {
    /// Creates the configuration, falling back to [`DEFAULT_TABLE_NAME`]
    ///
    /// A missing or blank name is logged and replaced by the default rather
    /// than treated as fatal.
    #[must_use]
    pub fn new(table_name: Option<String>) -> Self {
        let table_name = table_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("Table name is not configured, using {DEFAULT_TABLE_NAME}");
                DEFAULT_TABLE_NAME.to_string()
            });

        Self { table_name }
    }

    /// Configured table name
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}
