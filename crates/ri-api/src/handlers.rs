//! # ri-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use ri_core::error::AppError;
use ri_core::models::SessionState;
use ri_services::{ModerationService, ReplyFeed, SessionGate, SubmissionService};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub submissions: SubmissionService,
    pub moderation: ModerationService,
    pub feed: ReplyFeed,
    pub gate: Arc<SessionGate>,
}

type ApiResult = Result<HttpResponse, ApiError>;

/// The public caller may set `content` and nothing else.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: String,
}

/// Returns the bearer token, or "" when absent (rejected by the gate).
fn bearer_token(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .unwrap_or("")
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError(AppError::ValidationError(format!("invalid message id: {raw}"))))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Public: submit an anonymous message.
pub async fn submit_message(data: web::Data<AppState>, body: web::Json<SubmitRequest>) -> ApiResult {
    let id = data.submissions.submit(&body.content).await?;
    Ok(HttpResponse::Created().json(SubmitResponse { id }))
}

/// Public: recently answered messages.
pub async fn recent_replies(data: web::Data<AppState>, query: web::Query<FeedQuery>) -> ApiResult {
    let replies = data.feed.recent(query.limit).await?;
    Ok(HttpResponse::Ok().json(replies))
}

pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    match data.gate.authenticate(&body.secret).await? {
        SessionState::Authenticated(session) => Ok(HttpResponse::Ok().json(session)),
        SessionState::AuthFailed => Err(AppError::Unauthorized("invalid operator secret".to_string()).into()),
    }
}

/// Always succeeds; logging out twice is fine.
pub async fn logout(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    data.gate.logout(bearer_token(&req));
    HttpResponse::NoContent().finish()
}

pub async fn list_messages(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let messages = data.moderation.list(bearer_token(&req)).await?;
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn get_message(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> ApiResult {
    let id = parse_id(&path)?;
    let message = data.moderation.get(bearer_token(&req), id).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn mark_read(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> ApiResult {
    let id = parse_id(&path)?;
    let message = data.moderation.mark_read(bearer_token(&req), id).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn reply(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ReplyRequest>,
) -> ApiResult {
    let id = parse_id(&path)?;
    let message = data.moderation.set_reply(bearer_token(&req), id, &body.reply).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn delete_message(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> ApiResult {
    let id = parse_id(&path)?;
    data.moderation.delete(bearer_token(&req), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn stats(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let stats = data.moderation.stats(bearer_token(&req)).await?;
    Ok(HttpResponse::Ok().json(stats))
}
