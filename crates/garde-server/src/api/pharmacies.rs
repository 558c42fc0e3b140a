use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use garde_core::{NearestMatch, PharmacyRecord};
use garde_pipeline::{IngestionSummary, QueryError};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct PharmacyList {
    pub pharmacies: Vec<PharmacyRecord>,
    pub count: usize,
    /// Latest `updated_at` across the listed records.
    pub updated_at: Option<DateTime<Utc>>,
}

impl PharmacyList {
    fn new(pharmacies: Vec<PharmacyRecord>) -> Self {
        let updated_at = pharmacies.iter().map(|p| p.updated_at).max();
        Self {
            count: pharmacies.len(),
            pharmacies,
            updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshResult {
    pub updated: usize,
    pub reference_day: u8,
}

pub(super) async fn list_on_duty(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PharmacyList>>, ApiError> {
    let records = state
        .service
        .store()
        .get_by_flag(true)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PharmacyList::new(records),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_all(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PharmacyList>>, ApiError> {
    let records = state
        .service
        .store()
        .get_all()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PharmacyList::new(records),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_pharmacy(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PharmacyRecord>>, ApiError> {
    // Malformed ids cannot match any record.
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(ApiError::new(req_id.0, "not_found", "pharmacy not found"));
    };

    let record = state
        .service
        .store()
        .get_by_id(id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "pharmacy not found"))?;

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Accepts JSON numbers or numeric strings.
fn coordinate_field(body: &Value, key: &str) -> Option<f64> {
    match body.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(super) async fn nearest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<NearestMatch>>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                rejection.body_text(),
            ))
        }
    };

    let (Some(latitude), Some(longitude)) = (
        coordinate_field(&body, "latitude"),
        coordinate_field(&body, "longitude"),
    ) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "latitude and longitude are required numbers",
        ));
    };

    match state.service.query_nearest(latitude, longitude).await {
        Ok(found) => Ok(Json(ApiResponse {
            data: found,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(QueryError::Malformed(e)) => {
            Err(ApiError::new(req_id.0, "validation_error", e.to_string()))
        }
        Err(err @ QueryError::NotFound) => {
            Err(ApiError::new(req_id.0, "not_found", err.to_string()))
        }
        Err(QueryError::Store(e)) => Err(map_store_error(req_id.0, &e)),
    }
}

/// Run one ingestion. The outcome, success or not, is reported in `data`.
pub(super) async fn scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<IngestionSummary>> {
    let summary = state.service.run_ingestion().await;
    Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RefreshResult>>, ApiError> {
    let reference_day = state.service.today();
    let updated = state
        .service
        .refresh_duty_status(reference_day)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "duty refresh failed");
            ApiError::new(req_id.0.clone(), "internal_error", "duty refresh failed")
        })?;

    Ok(Json(ApiResponse {
        data: RefreshResult {
            updated,
            reference_day,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use garde_core::NewPharmacy;
    use garde_db::{MemoryStore, PharmacyStore};
    use tower::ServiceExt;

    use super::super::tests::{body_json, test_app};

    fn seeded(name: &str, is_open: bool, coords: Option<(f64, f64)>) -> NewPharmacy {
        NewPharmacy {
            name: name.to_string(),
            address: "Boulevard Pasteur".to_string(),
            phone: "0539 93 11 11".to_string(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            day_of_week: 2,
            is_open,
            updated_at: chrono::Utc::now(),
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_all(vec![
                seeded("Pharmacie Pasteur", true, Some((35.7770, -5.8120))),
                seeded("Pharmacie Malabata", false, Some((35.7760, -5.7800))),
                seeded("Pharmacie Marshan", true, Some((35.7880, -5.8200))),
            ])
            .await
            .expect("seed");
        store
    }

    fn nearest_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/pharmacies/nearest")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn on_duty_list_includes_count_and_updated_at() {
        let app = test_app(seeded_store().await, "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pharmacies")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["count"], 2);
        let names: Vec<&str> = json["data"]["pharmacies"]
            .as_array()
            .expect("pharmacies array")
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Pharmacie Pasteur", "Pharmacie Marshan"]);
        assert!(json["data"]["updated_at"].is_string());
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let app = test_app(Arc::new(MemoryStore::new()), "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pharmacies/all")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["count"], 0);
        assert!(json["data"]["updated_at"].is_null());
    }

    #[tokio::test]
    async fn get_by_id_returns_record_or_not_found() {
        let store = seeded_store().await;
        let id = store.get_all().await.expect("all")[1].id;
        let app = test_app(store, "http://127.0.0.1:9/");

        let found = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/pharmacies/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(body_json(found).await["data"]["name"], "Pharmacie Malabata");

        for path in [
            format!("/api/v1/pharmacies/{}", uuid::Uuid::new_v4()),
            "/api/v1/pharmacies/not-a-uuid".to_string(),
        ] {
            let missing = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(path)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(missing.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_json(missing).await["error"]["code"], "not_found");
        }
    }

    #[tokio::test]
    async fn nearest_returns_closest_on_duty_pharmacy() {
        let app = test_app(seeded_store().await, "http://127.0.0.1:9/");
        // Right next to Malabata, which is closed.
        let response = app
            .oneshot(nearest_request(
                r#"{"latitude": 35.7761, "longitude": "-5.7801"}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["pharmacy"]["name"], "Pharmacie Pasteur");
        assert!(json["data"]["distance_km"].as_f64().expect("distance") > 0.0);
    }

    #[tokio::test]
    async fn nearest_rejects_missing_or_non_numeric_fields() {
        for body in [
            r#"{"latitude": 35.77}"#,
            r#"{"latitude": "north", "longitude": -5.8}"#,
            r#"{"latitude": true, "longitude": -5.8}"#,
            "not json",
            r#"{"latitude": 95.0, "longitude": -5.8}"#,
        ] {
            let app = test_app(seeded_store().await, "http://127.0.0.1:9/");
            let response = app
                .oneshot(nearest_request(body))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(
                body_json(response).await["error"]["code"],
                "validation_error"
            );
        }
    }

    #[tokio::test]
    async fn nearest_without_located_on_duty_records_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_all(vec![seeded("Pharmacie Sans Position", true, None)])
            .await
            .expect("seed");
        let app = test_app(store, "http://127.0.0.1:9/");

        let response = app
            .oneshot(nearest_request(r#"{"latitude": 35.77, "longitude": -5.81}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn refresh_reports_updated_count() {
        let app = test_app(seeded_store().await, "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/pharmacies/refresh")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["updated"], 3);
        assert!(json["data"]["reference_day"].as_u64().expect("day") <= 6);
    }

    #[tokio::test]
    async fn scrape_failure_is_reported_in_data() {
        let store = seeded_store().await;
        let app = test_app(store.clone(), "http://127.0.0.1:9/");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pharmacies/scrape")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["success"], false);
        assert_eq!(json["data"]["count"], 0);
        assert_eq!(store.get_all().await.expect("all").len(), 3);
    }
}
