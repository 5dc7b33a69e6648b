//! HTTP handler functions for the apprehension dashboard API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use aprehensys_ai::AiError;
use aprehensys_analytics_models::FilterSelection;
use aprehensys_apprehension_models::Apprehension;
use aprehensys_server_models::{
    ApiError, ApiHealth, ApiStatus, DashboardQueryParams, FiltersQueryParams, InsightsRequest,
    InsightsResponse, LoadState,
};

use crate::{AppState, DatasetState, LOAD_FAILED_MESSAGE};

/// Returns the loaded records, or the response to send while the dataset is
/// unavailable.
async fn ready_records(state: &AppState) -> Result<Arc<Vec<Apprehension>>, HttpResponse> {
    match &*state.dataset.read().await {
        DatasetState::Ready { records, .. } => Ok(Arc::clone(records)),
        DatasetState::Loading => Err(HttpResponse::ServiceUnavailable()
            .json(ApiError::new("Los datos aún se están cargando"))),
        DatasetState::Failed => {
            Err(HttpResponse::InternalServerError().json(ApiError::new(LOAD_FAILED_MESSAGE)))
        }
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/status`
///
/// Reports whether the record set is loading, ready, or failed.
pub async fn status(state: web::Data<AppState>) -> HttpResponse {
    let status = match &*state.dataset.read().await {
        DatasetState::Loading => ApiStatus {
            state: LoadState::Loading,
            record_count: 0,
            rejected_count: 0,
            error: None,
        },
        DatasetState::Ready { records, rejected } => ApiStatus {
            state: LoadState::Ready,
            record_count: records.len(),
            rejected_count: *rejected,
            error: None,
        },
        DatasetState::Failed => ApiStatus {
            state: LoadState::Failed,
            record_count: 0,
            rejected_count: 0,
            error: Some(LOAD_FAILED_MESSAGE.to_string()),
        },
    };

    HttpResponse::Ok().json(status)
}

/// `GET /api/apprehensions`
///
/// Returns every admitted record in source order.
pub async fn apprehensions(state: web::Data<AppState>) -> HttpResponse {
    match ready_records(&state).await {
        Ok(records) => HttpResponse::Ok().json(records.as_slice()),
        Err(response) => response,
    }
}

/// `GET /api/dashboard`
///
/// Computes every derived view for the selection in the query string.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let records = match ready_records(&state).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let selection = FilterSelection::from(&*params);
    let dashboard = aprehensys_analytics::build_dashboard(&records, &selection, &state.map_defaults);

    HttpResponse::Ok().json(dashboard)
}

/// `GET /api/filters`
///
/// Returns selector option lists, with communes scoped to `municipality`.
pub async fn filters(
    state: web::Data<AppState>,
    params: web::Query<FiltersQueryParams>,
) -> HttpResponse {
    let records = match ready_records(&state).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let selection = FilterSelection::from(&*params);
    HttpResponse::Ok().json(aprehensys_analytics::filter_options(&records, &selection))
}

/// `POST /api/insights`
///
/// Generates narrative insights over the records matching the selection in
/// the body. Only one request runs at a time; overlapping requests get
/// `409`.
pub async fn insights(
    state: web::Data<AppState>,
    body: web::Json<InsightsRequest>,
) -> HttpResponse {
    let records = match ready_records(&state).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let Some(provider) = state.provider.as_deref() else {
        return HttpResponse::ServiceUnavailable()
            .json(ApiError::new("El servicio de IA no está configurado"));
    };

    let Ok(_guard) = state.insight_lock.try_lock() else {
        return HttpResponse::Conflict()
            .json(ApiError::new("Ya se están generando ideas para esta sesión"));
    };

    let filtered = aprehensys_analytics::filter(&records, &body.selection);
    let options = &state.insight_options;

    match aprehensys_ai::generate_insights(provider, &filtered, options).await {
        Ok(insights) => HttpResponse::Ok().json(InsightsResponse {
            insights,
            record_count: filtered.len(),
            sampled_count: filtered.len().min(options.max_records),
        }),
        Err(AiError::NoData) => HttpResponse::UnprocessableEntity().json(ApiError::new(
            "No hay datos para analizar. Aplique filtros diferentes.",
        )),
        Err(e) => {
            log::error!("Failed to generate insights: {e}");
            HttpResponse::BadGateway().json(ApiError::new(
                "Hubo un problema al generar las ideas. Por favor, inténtelo de nuevo.",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use aprehensys_ai::providers::{LlmProvider, LlmResponse, Message, StopReason};
    use aprehensys_source::normalize::Normalized;
    use chrono::NaiveDate;

    use super::*;
    use crate::configure;

    struct EchoProvider;

    #[async_trait::async_trait]
    impl LlmProvider for EchoProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            messages: &[Message],
        ) -> Result<LlmResponse, AiError> {
            Ok(LlmResponse {
                text: format!("{} bytes", messages[0].content.len()),
                stop_reason: StopReason::EndTurn,
            })
        }
    }

    fn record(id: &str, municipality: &str, value: f64) -> Apprehension {
        Apprehension {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            municipality: municipality.to_string(),
            commune: Some("1".to_string()),
            address: format!("Calle {id}"),
            classification: "TEXTILES".to_string(),
            sector: String::new(),
            origin: "RETEN".to_string(),
            commercial_value: value,
            lat: 7.9,
            lng: -72.5,
            leader: "POLFA".to_string(),
        }
    }

    async fn ready_state(provider: Option<Box<dyn LlmProvider>>) -> web::Data<AppState> {
        let state = web::Data::new(AppState::new(provider));
        state
            .finish_load(Ok(Normalized {
                records: vec![
                    record("1", "CUCUTA", 100.0),
                    record("2", "CUCUTA", 200.0),
                    record("3", "OCAÑA", 300.0),
                ],
                rejections: Vec::new(),
            }))
            .await;
        state
    }

    #[actix_web::test]
    async fn data_endpoints_wait_for_load() {
        let state = web::Data::new(AppState::new(None));
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/dashboard").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let req = test::TestRequest::get().uri("/api/status").to_request();
        let status: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["state"], "loading");
    }

    #[actix_web::test]
    async fn failed_load_is_terminal() {
        let state = web::Data::new(AppState::new(None));
        state
            .finish_load(Err(aprehensys_source::SourceError::Config {
                message: "no url".to_string(),
            }))
            .await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/apprehensions").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], LOAD_FAILED_MESSAGE);
    }

    #[actix_web::test]
    async fn dashboard_applies_query_selection() {
        let state = ready_state(None).await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/dashboard?municipality=CUCUTA&commune=all")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["stats"]["count"], 2);
        assert_eq!(body["stats"]["totalValue"], 300.0);
        assert_eq!(body["mapAggregated"], false);
        assert_eq!(body["hasResults"], true);
        assert_eq!(body["options"]["communes"], serde_json::json!(["all", "1"]));
    }

    #[actix_web::test]
    async fn filters_scope_communes() {
        let state = ready_state(None).await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/filters").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body["municipalities"],
            serde_json::json!(["all", "CUCUTA", "OCAÑA"])
        );
        assert_eq!(body["communes"], serde_json::json!(["all"]));
    }

    #[actix_web::test]
    async fn insights_without_provider_are_unavailable() {
        let state = ready_state(None).await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/insights")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn insights_use_filtered_records() {
        let state = ready_state(Some(Box::new(EchoProvider))).await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/insights")
            .set_json(serde_json::json!({ "municipality": "OCAÑA" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["recordCount"], 1);
        assert_eq!(body["sampledCount"], 1);

        let req = test::TestRequest::post()
            .uri("/api/insights")
            .set_json(serde_json::json!({ "municipality": "NOWHERE" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn overlapping_insight_request_conflicts() {
        let state = ready_state(Some(Box::new(EchoProvider))).await;
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let _held = state.insight_lock.lock().await;
        let req = test::TestRequest::post()
            .uri("/api/insights")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
