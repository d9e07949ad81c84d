use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, dashboard_routes};
use doctor_cell::router::doctor_routes;
use shared_database::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Maternity clinic API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/dashboard", dashboard_routes(state.clone()))
        .nest("/doctors", doctor_routes(state))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_database::InMemoryDirectory;
    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    use super::*;

    fn app() -> Router {
        let state = AppState::new(
            TestConfig::default().to_app_config(),
            Arc::new(InMemoryDirectory::new()),
        );
        create_router(state)
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Maternity clinic API is running!");
    }

    #[tokio::test]
    async fn test_cells_are_mounted() {
        let token = JwtTestUtils::create_test_token(
            &TestUser::admin("admin@clinic.example"),
            &TestConfig::default().jwt_secret,
            None,
        );

        for uri in ["/appointments", "/dashboard", "/doctors/schedules"] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .header("Authorization", format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }
}
