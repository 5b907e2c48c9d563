//! User DTOs

use serde::Deserialize;
use validator::Validate;

use domain_user::{NewUser, UserRole, UserUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Defaults to CUSTOMER; only admins may grant ADMIN
    pub role: Option<UserRole>,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(req: RegisterUserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            role: req.role.unwrap_or(UserRole::Customer),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub role: Option<UserRole>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        UserUpdate {
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            role: req.role,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub email: Option<String>,
}
