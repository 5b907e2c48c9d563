//! User directory service

use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{validation, Clock, UserId};

use crate::error::UserError;
use crate::ports::UserPort;
use crate::user::{NewUser, User, UserRole, UserUpdate};

pub struct UserService {
    port: Arc<dyn UserPort>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(port: Arc<dyn UserPort>, clock: Arc<dyn Clock>) -> Self {
        Self { port, clock }
    }

    /// Registers a new user
    ///
    /// # Errors
    ///
    /// * `Validation` if the name is blank or the email malformed
    /// * `DuplicateEmail` if another user already holds the email
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: NewUser) -> Result<User, UserError> {
        let name = validation::non_blank("name", &request.name)?;
        let email = validation::email("email", &request.email)?;

        if self.port.exists_by_email(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        let now = self.clock.now();
        let user = User {
            id: UserId::new_v7(),
            name,
            email,
            phone: trimmed(request.phone),
            address: trimmed(request.address),
            role: request.role,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let user = self.port.insert_user(&user).await.map_err(|e| match e {
            core_kernel::PortError::Duplicate { .. } => UserError::DuplicateEmail(user.email.clone()),
            other => UserError::Port(other),
        })?;
        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<User, UserError> {
        self.port
            .get_user(id)
            .await
            .map_err(|e| UserError::from_lookup(id, e))
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.port.list_users().await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let email = validation::non_blank("email", email)?;
        Ok(self.port.find_by_email(&email.to_ascii_lowercase()).await?)
    }

    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, UserError> {
        Ok(self.port.find_by_role(role).await?)
    }

    pub async fn exists(&self, id: UserId) -> Result<bool, UserError> {
        Ok(self.port.exists(id).await?)
    }

    /// Applies a partial update. Email uniqueness is rechecked when it changes.
    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update(&self, id: UserId, changes: UserUpdate) -> Result<User, UserError> {
        let mut user = self.get(id).await?;

        if let Some(name) = changes.name {
            user.name = validation::non_blank("name", &name)?;
        }
        if let Some(email) = changes.email {
            let email = validation::email("email", &email)?;
            if email != user.email && self.port.exists_by_email(&email).await? {
                return Err(UserError::DuplicateEmail(email));
            }
            user.email = email;
        }
        if changes.phone.is_some() {
            user.phone = trimmed(changes.phone);
        }
        if changes.address.is_some() {
            user.address = trimmed(changes.address);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = self.clock.now();

        let user = self.port.update_user(&user).await?;
        info!(version = user.version, "User updated");
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<(), UserError> {
        self.port
            .delete_user(id)
            .await
            .map_err(|e| UserError::from_lookup(id, e))?;
        info!("User deleted");
        Ok(())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
