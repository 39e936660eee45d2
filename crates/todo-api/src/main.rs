use infrastructure::{
    DynamoDbClient, DynamoDbTodoBackend, InMemoryTodoBackend, RetryConfig, TodoStore,
};
use lambda_http::{run, service_fn, Error, Request};
use shared::{init_tracing, AppError, Config, StoreBackend};
use todo_api::{route, AppContext};
use tracing::info;

async fn build_store(config: &Config) -> TodoStore {
    match config.store_backend {
        StoreBackend::DynamoDb => {
            let db = DynamoDbClient::new(config).await;
            TodoStore::new(DynamoDbTodoBackend::new(db, RetryConfig::from(config)))
        }
        StoreBackend::Memory => TodoStore::new(InMemoryTodoBackend::new()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;

    let config = Config::from_env().map_err(|e| AppError::Configuration(e.to_string()))?;
    let store = build_store(&config).await;

    info!(
        backend = store.backend_name(),
        environment = %config.environment,
        table = %config.dynamodb_table,
        "Starting todo-api"
    );

    let ctx = AppContext::new(store, config.default_page_limit);

    run(service_fn(move |req: Request| {
        let ctx = ctx.clone();
        async move { route(req, &ctx).await }
    }))
    .await
}
