use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::accounts::{AccountError, NewUser};
use crate::api::auth::bearer_token;
use crate::http::request::RequestIdExt;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;

const FIELDS_REQUIRED: &str = "Please fill in all fields.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub cid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// A present, non-empty field.
fn field(value: Option<String>) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(FIELDS_REQUIRED.to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(b)| b).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ApiError::BadRequest(FIELDS_REQUIRED.to_string())
    })
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let body = json_body(body)?;
    let user = NewUser {
        name: field(body.name)?,
        email: field(body.email)?,
        password: field(body.password)?,
    };

    match state.users.create(user).await {
        Ok(user) => {
            tracing::info!(request_id = %headers.request_id(), user_id = user.id, "User registered");
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse {
                    success: true,
                    message: "Registration successful!".to_string(),
                }),
            ))
        }
        Err(AccountError::DuplicateEmail) => {
            Err(ApiError::BadRequest("Email already exists.".to_string()))
        }
        Err(e) => {
            tracing::error!(request_id = %headers.request_id(), error = %e, "Registration failed");
            Err(ApiError::Internal("Server error.".to_string()))
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let body = json_body(body)?;
    let email = field(body.email)?;
    let password = field(body.password)?;

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %headers.request_id(), error = %e, "User lookup failed");
            ApiError::Internal("Server error.".to_string())
        })?
        .ok_or_else(|| ApiError::BadRequest("Email does not exist.".to_string()))?;

    if user.password != password {
        tracing::warn!(request_id = %headers.request_id(), user_id = user.id, "Wrong password");
        return Err(ApiError::BadRequest("Incorrect password.".to_string()));
    }

    let tokens = state.tokens.as_ref().ok_or_else(|| {
        ApiError::Internal("JWT secret is not configured.".to_string())
    })?;
    let token = tokens
        .issue(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(request_id = %headers.request_id(), user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful!".to_string(),
        token,
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;

    let tokens = state.tokens.as_ref().ok_or_else(|| {
        ApiError::Internal("JWT secret is not configured.".to_string())
    })?;
    tokens.verify(token).map_err(|e| {
        tracing::debug!(request_id = %headers.request_id(), error = %e, "Token rejected");
        ApiError::Unauthorized("Token is invalid or expired.".to_string())
    })?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Token is valid.".to_string(),
    }))
}

pub async fn upload_to_pinata(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Rejected upload");
        ApiError::BadRequest("Form parse error".to_string())
    })?;

    let mut upload = None;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Form parse error".to_string()))?
    {
        if part.name() != Some("file") {
            continue;
        }
        let file_name = part.file_name().unwrap_or("upload").to_string();
        let content_type = part.content_type().map(str::to_string);
        let bytes = part
            .bytes()
            .await
            .map_err(|_| ApiError::BadRequest("Form parse error".to_string()))?;
        upload = Some((file_name, content_type, bytes));
        break;
    }
    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("File not found".to_string()))?;

    let failed = || ApiError::Internal("Upload to Pinata failed".to_string());
    let pinning = state.pinning.as_ref().ok_or_else(failed)?;
    let cid = pinning
        .pin_file(&file_name, content_type.as_deref(), bytes.to_vec())
        .await
        .map_err(|e| {
            tracing::error!(request_id = %headers.request_id(), error = %e, "Pinning failed");
            failed()
        })?;
    tracing::info!(request_id = %headers.request_id(), cid = %cid, size = bytes.len(), "File pinned");

    Ok(Json(UploadResponse { cid }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed.".to_string())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
