//! API 模块
//!
//! 提供 REST API 支持，全部业务路由挂在 `/api/v1` 下。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use crate::api::app_state::AppState;
use crate::observability::{ObservabilityState, create_observability_router, metrics_middleware};
use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub fn create_router(app_state: AppState) -> Router {
    let request_timeout = Duration::from_secs(app_state.config.server.request_timeout);
    let timed = Router::new()
        .merge(routes::persona_routes::create_persona_router())
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::upload_routes::create_knowledge_router());
    let api = with_request_timeout(
        timed,
        routes::upload_routes::create_upload_router(),
        request_timeout,
    );

    let max_request_size = app_state.config.server.max_request_size;

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_request_size))
        .with_state(app_state)
}

/// 只给 `timed` 加请求超时，`untimed` 原样合并
///
/// 上传在请求内同步完成提取与嵌入，耗时随书籍大小增长，归入 `untimed`。
fn with_request_timeout<S>(timed: Router<S>, untimed: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    timed.layer(TimeoutLayer::new(timeout)).merge(untimed)
}

/// 业务路由 + 健康检查/指标路由，外加追踪、CORS 与指标中间件
pub fn create_app(app_state: AppState, observability: Arc<ObservabilityState>) -> Router {
    let metrics = app_state.metrics.clone();
    let request_timeout = Duration::from_secs(app_state.config.server.request_timeout);

    create_router(app_state)
        .merge(
            create_observability_router(observability).layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(axum::middleware::from_fn_with_state(
            metrics,
            metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
