use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use crate::error::{GatewayError, Result};
use crate::handlers::ClientId;
use crate::metrics::{
    RATE_LIMIT_CLIENTS, RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL, UPSTREAM_ERRORS_TOTAL,
};
use crate::models::{GenerationRequest, GenerationResult};
use crate::rate_limit::Admission;
use crate::state::AppState;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>> {
    REQUEST_TOTAL.inc();

    let admission = state.admission.check(&client);
    RATE_LIMIT_CLIENTS.set(state.admission.tracked_clients() as f64);

    match admission {
        Admission::Admitted { remaining } => {
            debug!(%client, remaining, "Request admitted");
        }
        Admission::Limited { retry_after } => {
            RATE_LIMITED_TOTAL.inc();
            debug!(%client, retry_after, "Rate limit exceeded");
            return Err(GatewayError::RateLimited { retry_after });
        }
    }

    // a missing key fails every request, whatever the body
    state.gateway.ensure_configured()?;

    let Json(request) = payload.map_err(|rejection| {
        debug!(%client, "Rejected request body: {}", rejection.body_text());
        GatewayError::Validation("Invalid JSON body".to_string())
    })?;

    let kind = request.kind.clone().unwrap_or_default();
    let start_time = Instant::now();

    let result = state.gateway.generate(request).await;

    match &result {
        Ok(generated) => {
            REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
            info!(
                content_type = %kind,
                %client,
                length = generated.content_chars(),
                "Generated content"
            );
        }
        Err(e) if e.is_upstream() => UPSTREAM_ERRORS_TOTAL.inc(),
        Err(_) => {}
    }

    result.map(Json)
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
}
