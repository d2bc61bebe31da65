use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rentwatch_infra::jobs::TaskError;

pub fn task_error_to_response(err: TaskError) -> axum::response::Response {
    let status = match &err {
        TaskError::UnknownTask(_) => StatusCode::NOT_FOUND,
        TaskError::TaskBusy(_) => StatusCode::CONFLICT,
        TaskError::RepositoryUnavailable(_) => StatusCode::BAD_GATEWAY,
        TaskError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
