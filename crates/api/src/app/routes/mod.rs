use axum::{routing::get, Router};

pub mod mail;
pub mod system;
pub mod tasks;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/test-mail", get(mail::test_mail))
        .nest("/tasks", tasks::router())
}
