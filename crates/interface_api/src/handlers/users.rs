//! User handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::UserId;
use domain_user::{NewUser, User, UserRole};

use crate::auth::Claims;
use crate::dto::parse_param;
use crate::dto::user::*;
use crate::{error::ApiError, AppState};

/// Registers a user. Granting the ADMIN role requires an admin caller.
pub async fn register_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    request.validate()?;
    if request.role == Some(UserRole::Admin) {
        claims.require_admin()?;
    }
    let user = state.users.register(NewUser::from(request)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Lists users, optionally by role or email (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    claims.require_admin()?;

    let users = if let Some(email) = query.email {
        state.users.find_by_email(&email).await?.into_iter().collect()
    } else if let Some(role) = query.role {
        state.users.list_by_role(parse_param(&role)?).await?
    } else {
        state.users.list().await?
    };
    Ok(Json(users))
}

/// The caller's own record
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get(claims.user_id()?).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    claims.require_self_or_admin(id)?;
    Ok(Json(state.users.get(id).await?))
}

/// Updates a user. Role changes are reserved for admins.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<UserId>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;
    claims.require_self_or_admin(id)?;
    if request.role.is_some() {
        claims.require_admin()?;
    }
    Ok(Json(state.users.update(id, request.into()).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    claims.require_self_or_admin(id)?;
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
