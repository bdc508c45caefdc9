//! Eventsource demo entry point.

use eventsource_core::aggregate::Aggregate;
use eventsource_core::registry::RegistryBuilder;
use eventsource_core::store::EventSourcedStore;
use eventsource_demo::config::Backend;
use eventsource_demo::error::AppError;
use eventsource_demo::scenario::run_scenario;
use eventsource_event_store::{InMemoryEventRepository, PgEventRepository};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting eventsource demo");

    let backend = Backend::from_env()?;

    let mut registry = RegistryBuilder::new();
    eventsource_users::register(&mut registry);
    let registry = registry.install()?;
    tracing::info!(
        aggregates = ?registry.aggregate_types(),
        events = ?registry.event_types(),
        "registry installed"
    );

    let user_id = Uuid::now_v7();
    let user = match backend {
        Backend::Memory => {
            let store = EventSourcedStore::with_global_registry(InMemoryEventRepository::new());
            run_scenario(&store, user_id).await?
        }
        Backend::Postgres(config) => {
            let pool = config.connect().await?;
            let repository = PgEventRepository::new(pool);
            repository.ensure_schema().await?;
            let store = EventSourcedStore::with_global_registry(repository);
            run_scenario(&store, user_id).await?
        }
    };

    tracing::info!(
        user_id = %user.id,
        status = %user.status,
        version = user.version(),
        "Demo finished"
    );
    Ok(())
}
