mod pharmacies;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use garde_pipeline::IngestionService;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestionService>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_store_error(request_id: String, error: &garde_db::StoreError) -> ApiError {
    tracing::error!(error = %error, "store operation failed");
    ApiError::new(request_id, "internal_error", "store operation failed")
}

/// `*` anywhere in the list (or an empty list) allows any origin.
fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/pharmacies", get(pharmacies::list_on_duty))
        .route("/api/v1/pharmacies/all", get(pharmacies::list_all))
        .route("/api/v1/pharmacies/nearest", post(pharmacies::nearest))
        .route(
            "/api/v1/pharmacies/scrape",
            get(pharmacies::scrape).post(pharmacies::scrape),
        )
        .route("/api/v1/pharmacies/refresh", post(pharmacies::refresh))
        .route("/api/v1/pharmacies/{id}", get(pharmacies::get_pharmacy))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(allowed_origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.service.store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    store: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use garde_core::Coordinates;
    use garde_db::{MemoryStore, PharmacyStore};
    use garde_pipeline::IngestionSettings;
    use garde_scraper::{build_client, PlaceholderLocator};
    use tower::ServiceExt;

    /// App over an in-memory store. The source URL points at a closed port so
    /// tests never reach the network unless they mean to.
    pub(crate) fn test_app(store: Arc<dyn PharmacyStore>, source_url: &str) -> Router {
        let service = IngestionService::new(
            store,
            build_client(2).expect("client builds"),
            Arc::new(PlaceholderLocator::new(
                Coordinates {
                    latitude: 35.7595,
                    longitude: -5.8340,
                },
                0.0,
            )),
            IngestionSettings {
                source_url: source_url.to_string(),
                user_agent: "garde-test/0.1".to_string(),
                locate_concurrency: 2,
                utc_offset_minutes: 60,
            },
        );
        build_app(
            AppState {
                service: Arc::new(service),
            },
            &["*".to_string()],
        )
    }

    pub(crate) async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unknown_code_maps_to_internal_error() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_ok_and_echoes_request_id() {
        let app = test_app(Arc::new(MemoryStore::new()), "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-health")
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-health");
    }

    #[tokio::test]
    async fn missing_request_id_is_generated() {
        let app = test_app(Arc::new(MemoryStore::new()), "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let header = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .expect("request id header");
        assert!(uuid::Uuid::parse_str(&header).is_ok());
        let json = body_json(response).await;
        assert_eq!(json["meta"]["request_id"], header.as_str());
    }

    #[tokio::test]
    async fn cors_allow_list_echoes_listed_origin_only() {
        let service = IngestionService::new(
            Arc::new(MemoryStore::new()),
            build_client(2).expect("client builds"),
            Arc::new(PlaceholderLocator::new(
                Coordinates {
                    latitude: 35.7595,
                    longitude: -5.8340,
                },
                0.0,
            )),
            IngestionSettings {
                source_url: "http://127.0.0.1:9/".to_string(),
                user_agent: "garde-test/0.1".to_string(),
                locate_concurrency: 1,
                utc_offset_minutes: 0,
            },
        );
        let app = build_app(
            AppState {
                service: Arc::new(service),
            },
            &["https://garde.example".to_string()],
        );

        let allowed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("origin", "https://garde.example")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("https://garde.example")
        );

        let other = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("origin", "https://elsewhere.example")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert!(other.headers().get("access-control-allow-origin").is_none());
    }
}
