use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use raboneko_core::report::ChanceSource;
use raboneko_db::{DbPool, ProgressLogRepository};
use raboneko_discord::api::DiscordApi;

use crate::report::{ReportSummary, WeeklyReportService};

pub struct HttpState<R, A, C> {
    db_pool: DbPool,
    report: Arc<WeeklyReportService<R, A, C>>,
}

impl<R, A, C> Clone for HttpState<R, A, C> {
    fn clone(&self) -> Self {
        Self { db_pool: self.db_pool.clone(), report: Arc::clone(&self.report) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn router<R, A, C>(db_pool: DbPool, report: Arc<WeeklyReportService<R, A, C>>) -> Router
where
    R: ProgressLogRepository + 'static,
    A: DiscordApi + 'static,
    C: ChanceSource + 'static,
{
    Router::new()
        .route("/health", get(health::<R, A, C>))
        .route("/report", post(run_report::<R, A, C>))
        .with_state(HttpState { db_pool, report })
}

/// Binds the listener and serves health plus the external report trigger.
/// The weekly cadence itself lives outside the process (cron hitting
/// `POST /report`); there is no in-process scheduler.
pub async fn spawn<R, A, C>(
    bind_address: &str,
    port: u16,
    db_pool: DbPool,
    report: Arc<WeeklyReportService<R, A, C>>,
) -> std::io::Result<()>
where
    R: ProgressLogRepository + 'static,
    A: DiscordApi + 'static,
    C: ChanceSource + 'static,
{
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(bind_address = %address, "http endpoint started");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool, report)).await {
            error!(error = %error, "http server terminated unexpectedly");
        }
    });

    Ok(())
}

pub async fn health<R, A, C>(
    State(state): State<HttpState<R, A, C>>,
) -> (StatusCode, Json<HealthResponse>)
where
    R: ProgressLogRepository + 'static,
    A: DiscordApi + 'static,
    C: ChanceSource + 'static,
{
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "raboneko-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

pub async fn run_report<R, A, C>(
    State(state): State<HttpState<R, A, C>>,
) -> (StatusCode, Json<ReportResponse>)
where
    R: ProgressLogRepository + 'static,
    A: DiscordApi + 'static,
    C: ChanceSource + 'static,
{
    match state.report.post_weekly_report(Utc::now()).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ReportResponse { status: "posted", summary: Some(summary), detail: None }),
        ),
        Err(error) => {
            error!(error = %error, "weekly report failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReportResponse {
                    status: "failed",
                    summary: None,
                    detail: Some(error.to_string()),
                }),
            )
        }
    }
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "unavailable", detail: format!("database query failed: {error}") }
        }
    }
}
