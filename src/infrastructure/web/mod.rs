//! Web 服务器模块
//!
//! 提供访问码台账的 HTTP API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::application::AccessLedger;
use crate::domain::access_code::iso8601;
use crate::errors::LedgerError;

// ==================== 错误响应 ====================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn store_error_response(err: LedgerError) -> Response {
    let status = match &err {
        LedgerError::StoreUnavailable(_) => {
            warn!("access ledger store unavailable: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => {
            error!("access ledger store error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ==================== 状态 ====================

#[derive(Clone)]
pub struct AppState {
    pub ledger: AccessLedger,
}

// ==================== 请求类型 ====================

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
    pub user_id: String,
}

// ==================== API 响应类型 ====================

#[derive(Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub expiration: String,
    pub used: bool,
}

/// 每个请求一个带 request_id 的 span
fn request_span(operation: &'static str) -> Span {
    info_span!(
        "request",
        operation,
        request_id = %uuid::Uuid::new_v4()
    )
}

// ==================== 处理器 ====================

/// 健康检查
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 生成访问码
async fn generate_code(State(state): State<Arc<AppState>>) -> Response {
    async move {
        match state.ledger.generate_code().await {
            Ok(issued) => (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "success": true,
                    "data": {
                        "code": issued.code,
                        "expiration": iso8601::format_utc(&issued.expiration),
                    }
                })),
            )
                .into_response(),
            Err(e) => store_error_response(e),
        }
    }
    .instrument(request_span("generate"))
    .await
}

/// 列出有效访问码
async fn list_active_codes(State(state): State<Arc<AppState>>) -> Response {
    async move {
        match state.ledger.list_active_codes().await {
            Ok(codes) => {
                let data: Vec<CodeResponse> = codes
                    .into_iter()
                    .map(|c| CodeResponse {
                        expiration: iso8601::format_utc(&c.expiration),
                        code: c.code,
                        used: c.used,
                    })
                    .collect();
                Json(serde_json::json!({
                    "success": true,
                    "data": data,
                }))
                .into_response()
            }
            Err(e) => store_error_response(e),
        }
    }
    .instrument(request_span("list_active"))
    .await
}

/// 兑换访问码
///
/// 兑换失败也返回 200，结果放在 `authorized` / `reason` 中
async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyCodeRequest>,
) -> Response {
    async move {
        if req.user_id.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "user_id must not be empty".to_string(),
                }),
            )
                .into_response();
        }

        match state.ledger.verify_code(&req.code, &req.user_id).await {
            Ok(verification) => Json(serde_json::json!({
                "success": true,
                "data": {
                    "authorized": verification.authorized,
                    "reason": verification.reason,
                    "message": verification.reason.message(),
                }
            }))
            .into_response(),
            Err(e) => store_error_response(e),
        }
    }
    .instrument(request_span("verify"))
    .await
}

/// 查询用户授权状态
async fn check_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Response {
    async move {
        match state.ledger.is_user_authorized(&user_id).await {
            Ok(authorized) => Json(serde_json::json!({
                "success": true,
                "data": {
                    "user_id": user_id,
                    "authorized": authorized,
                }
            }))
            .into_response(),
            Err(e) => store_error_response(e),
        }
    }
    .instrument(request_span("is_authorized"))
    .await
}

// ==================== 路由 ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/codes", get(list_active_codes).post(generate_code))
        .route("/api/codes/verify", post(verify_code))
        .route("/api/users/{user_id}/authorized", get(check_user))
        .layer(cors)
        .with_state(state)
}

/// 启动 Web 服务器
pub async fn start_web_server(bind_addr: &str, ledger: AccessLedger) -> anyhow::Result<()> {
    let state = Arc::new(AppState { ledger });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Web server started on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
