//! The demo's user lifecycle.

use eventsource_core::aggregate::Aggregate;
use eventsource_core::store::{AggregateStore, AggregateStoreExt};
use eventsource_users::application::command_handlers::{handle_register_user, handle_verify_user};
use eventsource_users::domain::aggregates::{USER_AGGREGATE, User};
use eventsource_users::domain::commands::{RegisterUser, VerifyUser};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

/// Registers and verifies a user, then loads it back from the store.
///
/// # Errors
///
/// Returns `AppError` if a command is rejected or the store fails.
pub async fn run_scenario(store: &dyn AggregateStore, user_id: Uuid) -> Result<Box<User>, AppError> {
    let register = RegisterUser {
        user_id,
        name: "Amira".to_owned(),
        email: "a@x.com".to_owned(),
        password: "pw".to_owned(),
    };
    handle_register_user(&register, store).await?;
    handle_verify_user(&VerifyUser { user_id }, store).await?;

    let user = store.load_as::<User>(USER_AGGREGATE, user_id).await?;
    info!(
        %user_id,
        name = %user.name,
        status = %user.status,
        version = user.version(),
        "user reloaded"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eventsource_core::registry::RegistryBuilder;
    use eventsource_core::store::EventSourcedStore;
    use eventsource_event_store::InMemoryEventRepository;
    use eventsource_test_support::{FailingEventRepository, FixedClock};
    use eventsource_users::domain::aggregates::UserStatus;

    use super::*;

    fn registry() -> eventsource_core::registry::Registry {
        let mut builder = RegistryBuilder::new();
        eventsource_users::register(&mut builder);
        builder.build()
    }

    #[tokio::test]
    async fn test_run_scenario_yields_active_user() {
        // Arrange
        let store = EventSourcedStore::new(
            InMemoryEventRepository::new(),
            registry(),
            Arc::new(FixedClock::default()),
        );
        let user_id = Uuid::new_v4();

        // Act
        let user = run_scenario(&store, user_id).await.unwrap();

        // Assert
        assert_eq!(user.id, user_id);
        assert_eq!(user.name, "Amira");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.password, "pw");
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.version(), 2);
    }

    #[tokio::test]
    async fn test_run_scenario_surfaces_store_failure() {
        let store = EventSourcedStore::new(
            FailingEventRepository,
            registry(),
            Arc::new(FixedClock::default()),
        );

        let result = run_scenario(&store, Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::User(_))));
    }
}
