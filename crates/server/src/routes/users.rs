//! User account endpoints.
//!
//! Every handler validates presence of its inputs, calls the repository and
//! maps the outcome to a status code. Store failures become 500 with the
//! error detail in the body.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use service::users::{domain::require, NewUser, PublicUser, UserError, UserPatch, UserRepository};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

/// Body of `POST /register` and `PUT /user/:id`.
#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub total_users: usize,
    #[serde(rename = "allUsers")]
    pub all_users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct UserOutput {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct RegisterOutput {
    #[serde(rename = "newUser")]
    pub new_user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UpdateOutput {
    #[serde(rename = "updatedUser")]
    pub updated_user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MsgOutput {
    pub msg: String,
}

impl UserBody {
    fn into_new_user(self) -> Result<NewUser, UserError> {
        Ok(NewUser {
            username: require(self.username, "username")?,
            email: require(self.email, "email")?,
            password: require(self.password, "password")?,
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rej| ApiError::BadRequest(rej.body_text()))
}

fn path_id(id: String) -> Result<String, ApiError> {
    require(Some(id), "id").map_err(ApiError::from)
}

fn not_found_as(msg: String) -> impl FnOnce(UserError) -> ApiError {
    move |e| match e {
        UserError::NotFound => ApiError::NotFound(msg),
        other => other.into(),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Response {
    let all = state.users.find_all().await;
    if all.is_empty() {
        let msg = MsgOutput { msg: "No users at this time.".into() };
        return (StatusCode::NOT_FOUND, Json(msg)).into_response();
    }
    let all_users: Vec<PublicUser> = all.into_iter().map(PublicUser::from).collect();
    Json(ListOutput { total_users: all_users.len(), all_users }).into_response()
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserOutput>, ApiError> {
    let id = path_id(id)?;
    let user = state
        .users
        .find_one(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found!".into()))?;
    Ok(Json(UserOutput { user: user.into() }))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterOutput>), ApiError> {
    let input = body(payload)?.into_new_user()?;
    let created = state.users.register(input).await?;
    info!(user_id = %created.id, "registered via http");
    Ok((StatusCode::CREATED, Json(RegisterOutput { new_user: created.into() })))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<UserOutput>, ApiError> {
    let input = body(payload)?;
    let email = require(input.email, "email")?;
    let password = require(input.password, "password")?;
    // unknown email and wrong password are indistinguishable to the caller
    let user = state
        .users
        .compare_password(&email, &password)
        .await
        .map_err(|e| match e {
            UserError::NotFound | UserError::PasswordMismatch => {
                ApiError::BadRequest(UserError::PasswordMismatch.to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(UserOutput { user: user.into() }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserBody>, JsonRejection>,
) -> Result<Json<UpdateOutput>, ApiError> {
    let id = path_id(id)?;
    let input = body(payload)?.into_new_user()?;
    let patch = UserPatch {
        username: Some(input.username),
        email: Some(input.email),
        password: Some(input.password),
    };
    let updated = state
        .users
        .update(&id, patch)
        .await
        .map_err(not_found_as(format!("No user with id {id}")))?;
    Ok(Json(UpdateOutput { updated_user: updated.into() }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MsgOutput>, ApiError> {
    let id = path_id(id)?;
    state
        .users
        .delete(&id)
        .await
        .map_err(not_found_as("User does not exist".into()))?;
    Ok(Json(MsgOutput { msg: "User deleted".into() }))
}
