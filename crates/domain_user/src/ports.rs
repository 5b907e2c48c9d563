//! User Domain Ports
//!
//! The `UserPort` trait is everything the user domain needs from storage.
//! The PostgreSQL adapter lives in `infra_db`; an in-memory adapter is
//! available behind the `mock` feature for tests in downstream crates.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError, UserId};

use crate::user::{User, UserRole};

#[async_trait]
pub trait UserPort: DomainPort + HealthCheckable {
    /// Retrieves a user by ID, or `PortError::NotFound`
    async fn get_user(&self, id: UserId) -> Result<User, PortError>;

    async fn list_users(&self) -> Result<Vec<User>, PortError>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError>;

    async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>, PortError>;

    async fn exists(&self, id: UserId) -> Result<bool, PortError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, PortError>;

    /// Stores a new user. Fails with `PortError::Duplicate` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<User, PortError>;

    /// Compare-and-set on `user.version`; returns the stored copy with the
    /// bumped version, or `PortError::Conflict` if the stored version differs.
    async fn update_user(&self, user: &User) -> Result<User, PortError>;

    async fn delete_user(&self, id: UserId) -> Result<(), PortError>;
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of UserPort
    #[derive(Debug, Default)]
    pub struct MockUserPort {
        users: Arc<RwLock<HashMap<UserId, User>>>,
        fail_next_save: AtomicBool,
    }

    impl MockUserPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let port = Self::new();
            for user in users {
                port.users.write().await.insert(user.id, user);
            }
            port
        }

        /// The next insert or update fails with a connection error
        pub fn fail_next_save(&self) {
            self.fail_next_save.store(true, Ordering::SeqCst);
        }

        fn injected_failure(&self) -> Result<(), PortError> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(PortError::connection("injected save failure"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockUserPort {}

    #[async_trait]
    impl HealthCheckable for MockUserPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-user-port", 0)
        }
    }

    #[async_trait]
    impl UserPort for MockUserPort {
        async fn get_user(&self, id: UserId) -> Result<User, PortError> {
            self.users
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }

        async fn list_users(&self) -> Result<Vec<User>, PortError> {
            let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
            users.sort_by_key(|u| u.created_at);
            Ok(users)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>, PortError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .filter(|u| u.role == role)
                .cloned()
                .collect())
        }

        async fn exists(&self, id: UserId) -> Result<bool, PortError> {
            Ok(self.users.read().await.contains_key(&id))
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, PortError> {
            Ok(self.find_by_email(email).await?.is_some())
        }

        async fn insert_user(&self, user: &User) -> Result<User, PortError> {
            self.injected_failure()?;
            let mut users = self.users.write().await;
            if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
                return Err(PortError::duplicate(format!("email {}", user.email)));
            }
            users.insert(user.id, user.clone());
            Ok(user.clone())
        }

        async fn update_user(&self, user: &User) -> Result<User, PortError> {
            self.injected_failure()?;
            let mut users = self.users.write().await;
            let stored = users
                .get(&user.id)
                .ok_or_else(|| PortError::not_found("User", user.id))?;
            if stored.version != user.version {
                return Err(PortError::conflict("User", user.id, user.version));
            }
            if users
                .values()
                .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
            {
                return Err(PortError::duplicate(format!("email {}", user.email)));
            }
            let mut saved = user.clone();
            saved.version += 1;
            users.insert(saved.id, saved.clone());
            Ok(saved)
        }

        async fn delete_user(&self, id: UserId) -> Result<(), PortError> {
            self.users
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("User", id))
        }
    }
}
