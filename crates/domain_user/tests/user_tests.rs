//! User entity tests

use chrono::Utc;
use core_kernel::{Classify, ErrorKind, PortError, UserId, ValidationError};
use domain_user::{NewUser, User, UserError, UserRole};

fn sample_user() -> User {
    let now = Utc::now();
    User {
        id: UserId::new(),
        name: "Bilal Ahmed".to_string(),
        email: "bilal@example.com".to_string(),
        phone: Some("+92 300 1234567".to_string()),
        address: None,
        role: UserRole::Customer,
        created_at: now,
        updated_at: now,
        version: 1,
    }
}

#[test]
fn test_new_user_builder() {
    let request = NewUser::new("Bilal", "bilal@example.com", UserRole::Admin)
        .with_phone("+92 300 1234567")
        .with_address("Lahore");

    assert_eq!(request.phone.as_deref(), Some("+92 300 1234567"));
    assert_eq!(request.address.as_deref(), Some("Lahore"));
    assert_eq!(request.role, UserRole::Admin);
}

#[test]
fn test_user_serializes_role_uppercase() {
    let value = serde_json::to_value(sample_user()).unwrap();
    assert_eq!(value["role"], "CUSTOMER");
    assert_eq!(value["version"], 1);
}

#[test]
fn test_error_kinds() {
    assert_eq!(UserError::UserNotFound(UserId::new()).kind(), ErrorKind::NotFound);
    assert_eq!(
        UserError::DuplicateEmail("a@b.com".into()).kind(),
        ErrorKind::Duplicate
    );
    assert_eq!(
        UserError::from(ValidationError::new("email", "is required")).kind(),
        ErrorKind::InvalidInput
    );
    assert_eq!(
        UserError::from(PortError::conflict("User", "USR-1", 1)).kind(),
        ErrorKind::Conflict
    );
}
