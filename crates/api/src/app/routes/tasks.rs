use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks))
        .route("/status/:task_name", get(task_status))
        .route("/trigger", post(trigger_task))
}

pub async fn list_tasks(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let tasks: BTreeMap<String, &'static str> = services
        .registry
        .list_all()
        .into_iter()
        .map(|(name, status)| (name.to_string(), status.as_str()))
        .collect();
    Json(tasks).into_response()
}

pub async fn task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(task_name): Path<String>,
) -> axum::response::Response {
    match services.registry.status(&task_name) {
        Ok(status) => Json(dto::TaskStatusResponse {
            name: task_name,
            status: status.as_str(),
        })
        .into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

/// Run one task now and wait for its scan to finish.
pub async fn trigger_task(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::TriggerTaskRequest>,
) -> axum::response::Response {
    let name = body.task_name.trim();
    match services.registry.trigger(name).await {
        Ok(report) => Json(dto::TriggerTaskResponse {
            message: format!("Task {name} triggered successfully"),
            report: dto::ScanReportDto::from(&report),
        })
        .into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}
