use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers::{
    chart_handler, health_handler, identities_handler, index_handler, preview_handler, screen_handler,
    static_handler, summary_handler, summary_page_handler, AppState,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // API routes
        .route("/api/health", get(health_handler))
        .route("/api/identities", get(identities_handler))
        .route("/api/screen/instances", get(screen_handler))
        .route(
            "/api/provider/{provider}/identity/{identity}/summary",
            get(summary_handler),
        )
        .route(
            "/api/provider/{provider}/identity/{identity}/chart/{kind}",
            get(chart_handler),
        )
        .route(
            "/api/provider/{provider}/identity/{identity}/chart/{kind}/preview",
            post(preview_handler),
        )
        // HTML fragments
        .route("/provider/{provider}/identity/{identity}", get(summary_page_handler))
        // Embedded dashboard
        .route("/", get(index_handler))
        .route("/static/{*path}", get(static_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::application::usage::tests::FakeApi;
    use crate::adapters::MemoryStore;
    use crate::application::{ChartRegistry, Collections, InstanceScreen, SummaryService, UsageService};
    use crate::domain::{IdentityRef, Instance, InstanceSize, Profile, Quota, Volume};

    fn router(api: FakeApi) -> Router {
        let api = Arc::new(api);
        let usage = Arc::new(UsageService::new(api.clone()));
        let charts = Arc::new(ChartRegistry::new());
        let summaries = Arc::new(SummaryService::new(
            api,
            usage.clone(),
            charts.clone(),
            Some(IdentityRef::new("1", "7")),
            Vec::new(),
        ));
        create_router(AppState {
            usage,
            charts,
            summaries,
            screen: None,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(FakeApi::healthy())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "quotaboard");
    }

    #[tokio::test]
    async fn test_chart_endpoint() {
        let response = router(FakeApi::healthy())
            .oneshot(
                Request::get("/api/provider/1/identity/7/chart/disk")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["chart"]["status"], "ready");
        assert_eq!(json["chart"]["percent"], 50);
        assert_eq!(json["chart"]["segments"][0]["tier"], "warn");
    }

    #[tokio::test]
    async fn test_failed_quota_is_not_a_server_error() {
        let response = router(FakeApi {
            quota: None,
            ..FakeApi::healthy()
        })
        .oneshot(
            Request::get("/api/provider/1/identity/7/chart/cpu")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["chart"]["status"], "unavailable");
        assert_eq!(json["chart"]["message"], "Could not fetch cpu quota.");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected() {
        let response = router(FakeApi::healthy())
            .oneshot(
                Request::get("/api/provider/1/identity/7/chart/gpu")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_traversal_in_identity_is_rejected() {
        let response = router(FakeApi::healthy())
            .oneshot(
                Request::get("/api/provider/1/identity/..%2F..%2Fgroup0/chart/cpu")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_identity_creates_no_state() {
        let api = Arc::new(FakeApi::healthy());
        let usage = Arc::new(UsageService::new(api.clone()));
        let charts = Arc::new(ChartRegistry::new());
        let summaries = Arc::new(SummaryService::new(
            api,
            usage.clone(),
            charts.clone(),
            Some(IdentityRef::new("1", "7")),
            Vec::new(),
        ));
        let app = create_router(AppState {
            usage,
            charts: charts.clone(),
            summaries: summaries.clone(),
            screen: None,
        });

        for id in 100..120 {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/api/provider/1/identity/{}/chart/cpu", id))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
        let response = app
            .oneshot(Request::get("/provider/1/identity/100").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(charts.len(), 0);
        assert!(!summaries.is_cached(&IdentityRef::new("1", "100")));
    }

    #[tokio::test]
    async fn test_preview_endpoint() {
        let request = Request::post("/api/provider/1/identity/7/chart/cpu/preview")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"delta": 12, "direction": "add"}"#))
            .unwrap();
        let response = router(FakeApi::healthy()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["under_quota"], false);
        assert_eq!(json["chart"]["info"]["message"], "Quota Exceeded. Choose a smaller size or terminate a running instance.");
    }

    #[tokio::test]
    async fn test_summary_fragment() {
        let response = router(FakeApi::healthy())
            .oneshot(Request::get("/provider/1/identity/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("CURRENT"));
        assert!(html.contains("You are using 5 of 16 available CPUs."));
        assert!(html.contains("<td>data</td>"));
    }

    #[tokio::test]
    async fn test_screen_requires_selected_identity() {
        let response = router(FakeApi::healthy())
            .oneshot(Request::get("/api/screen/instances").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_screen_snapshot() {
        let api = Arc::new(FakeApi::healthy());
        let usage = Arc::new(UsageService::new(api.clone()));
        let charts = Arc::new(ChartRegistry::new());
        let collections = Collections {
            profile: Arc::new(MemoryStore::with_items(vec![Profile::new(
                IdentityRef::new("1", "7"),
                Quota {
                    cpu: 8.0,
                    mem: 16.0,
                    disk: 100.0,
                    disk_count: 5.0,
                },
            )])),
            instances: Arc::new(MemoryStore::with_items(vec![Instance::new("web", "large", "active")])),
            volumes: Arc::new(MemoryStore::<Volume>::new()),
            sizes: Arc::new(MemoryStore::with_items(vec![InstanceSize::new("large", 4.0, 8192.0)])),
        };
        let screen = Arc::new(InstanceScreen::new(collections));
        screen.attach();

        let app = create_router(AppState {
            summaries: Arc::new(SummaryService::new(api, usage.clone(), charts.clone(), None, Vec::new())),
            usage,
            charts,
            screen: Some(screen),
        });
        let response = app
            .oneshot(Request::get("/api/screen/instances").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["empty"], false);
        assert_eq!(json["instances"][0]["name"], "web");
        assert_eq!(json["charts"][0]["percent"], 50);
        assert_eq!(json["charts"][1]["info"]["message"], "You are using 8 GB of 16 GB allotted memory.");
    }

    #[tokio::test]
    async fn test_stylesheet_content_type() {
        let response = router(FakeApi::healthy())
            .oneshot(Request::get("/static/dashboard.css").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/css");
    }

    #[tokio::test]
    async fn test_index_is_embedded() {
        let response = router(FakeApi::healthy())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<html"));
    }
}
