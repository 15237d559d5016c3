pub mod health;

use crate::state::AppState;
use axum::{Router, routing::get};
use axum_helpers::JwtAuth;
use domain_users::{UserRepository, UserService, handlers};

/// `/account/*` and `/user/*`; nested under `/api` by `create_router`.
pub fn routes<R: UserRepository + 'static>(service: UserService<R>, jwt: JwtAuth) -> Router {
    handlers::router(service, jwt)
}

pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ready_reports_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = ready_router(AppState { db });

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
