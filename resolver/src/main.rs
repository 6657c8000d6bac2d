use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use chat_storage::store::{DynamoDbBackend, SingleTableStore};
use resolver::{server, state::ChatServices, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let table_config = environment.table_config();
    tracing::info!("Using table {}", table_config.table_name());

    let backend = DynamoDbBackend::new(dynamodb_client, &table_config);
    let store = Arc::new(SingleTableStore::new(Arc::new(backend)));

    server::start(environment, ChatServices::new(store)).await
}
