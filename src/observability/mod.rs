//! 可观测性模块
//!
//! 提供 Prometheus 指标、结构化日志和健康检查。

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::models::message::TriggerType;

// ===== Simple Metrics =====

/// 简单应用指标
#[derive(Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub active_connections: AtomicI64,
    pub chat_turns_total: AtomicU64,
    pub triggers_unprofessional: AtomicU64,
    pub triggers_pitfall: AtomicU64,
    pub triggers_condition_specific: AtomicU64,
    pub sessions_ended_total: AtomicU64,
    pub completion_failures_total: AtomicU64,
    pub retrieval_failures_total: AtomicU64,
    pub files_uploaded_total: AtomicU64,
    pub files_failed_total: AtomicU64,
    pub errors_total: AtomicU64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64, is_error: bool) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
        if is_error {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 记录活跃连接
    pub fn record_connection(&self, delta: i64) {
        self.active_connections.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_turn(&self) {
        self.chat_turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger(&self, trigger_type: TriggerType) {
        let counter = match trigger_type {
            TriggerType::Unprofessional => &self.triggers_unprofessional,
            TriggerType::Pitfall => &self.triggers_pitfall,
            TriggerType::ConditionSpecific => &self.triggers_condition_specific,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 病人离开会话
    pub fn record_session_ended(&self) {
        self.sessions_ended_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completion_failure(&self) {
        self.completion_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retrieval_failure(&self) {
        self.retrieval_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一个文件的处理结果
    pub fn record_file(&self, ok: bool) {
        if ok {
            self.files_uploaded_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_failed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP active_connections Active HTTP connections
# TYPE active_connections gauge
active_connections {}
# HELP chat_turns_total Total chat turns
# TYPE chat_turns_total counter
chat_turns_total {}
# HELP triggers_total Detected negative triggers by type
# TYPE triggers_total counter
triggers_total{{type="unprofessional"}} {}
triggers_total{{type="pitfall"}} {}
triggers_total{{type="condition-specific"}} {}
# HELP sessions_ended_total Sessions the patient has left
# TYPE sessions_ended_total counter
sessions_ended_total {}
# HELP completion_failures_total Failed completion requests
# TYPE completion_failures_total counter
completion_failures_total {}
# HELP retrieval_failures_total Failed knowledge retrievals
# TYPE retrieval_failures_total counter
retrieval_failures_total {}
# HELP files_processed_total Processed book files by result
# TYPE files_processed_total counter
files_processed_total{{result="completed"}} {}
files_processed_total{{result="error"}} {}
# HELP errors_total Total error responses
# TYPE errors_total counter
errors_total {}
"#,
            load(&self.http_requests_total),
            load(&self.http_request_duration_sum) as f64 / 1000.0,
            load(&self.http_requests_total),
            self.active_connections.load(Ordering::Relaxed),
            load(&self.chat_turns_total),
            load(&self.triggers_unprofessional),
            load(&self.triggers_pitfall),
            load(&self.triggers_condition_specific),
            load(&self.sessions_ended_total),
            load(&self.completion_failures_total),
            load(&self.retrieval_failures_total),
            load(&self.files_uploaded_total),
            load(&self.files_failed_total),
            load(&self.errors_total),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// 健康检查结果
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub name: String,
    pub healthy: bool,
    pub message: String,
    pub latency_ms: u64,
}

/// 可观测性状态
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub health_checks: Mutex<Vec<HealthCheckResult>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: &str, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            health_checks: Mutex::new(Vec::new()),
            start_time: Utc::now(),
            version: version.to_string(),
        }
    }

    /// 添加健康检查结果，同名检查会被替换
    pub async fn add_health_check(&self, result: HealthCheckResult) {
        let mut checks = self.health_checks.lock().await;
        checks.retain(|c| c.name != result.name);
        checks.push(result);
        if checks.len() > 10 {
            checks.remove(0);
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

fn health_label(healthy: bool) -> String {
    if healthy { "healthy" } else { "unhealthy" }.to_string()
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    let all_healthy = checks.iter().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: health_label(all_healthy),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: checks
            .iter()
            .map(|c| HealthCheck {
                name: c.name.clone(),
                status: health_label(c.healthy),
                message: Some(c.message.clone()),
                latency_ms: Some(c.latency_ms),
            })
            .collect(),
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查
pub async fn readiness(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    if checks.iter().all(|c| c.healthy) {
        (StatusCode::OK, "Ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not Ready")
    }
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// 版本信息端点
pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化日志
///
/// RUST_LOG 优先于配置中的级别。配置了 `log_dir` 时额外写入按天滚动的文件，
/// 返回的 guard 必须在进程退出前一直持有。
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

    let (file_writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vpatient.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.structured {
        registry
            .with(fmt::layer().json().with_target(true))
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already initialized: {}", e);
    }

    guard
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = std::time::Instant::now();
    metrics.record_connection(1);

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    metrics.record_http_request(duration_ms, response.status().is_server_error());
    metrics.record_connection(-1);

    response
}
