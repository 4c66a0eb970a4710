//! HTTP request handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::ServerState;
use crate::error::UtilizationError;
use crate::models::ComputeUtilizationResponse;

/// Body of an error response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// HTTP status an error is reported with.
pub fn status_code(error: &UtilizationError) -> StatusCode {
    match error {
        UtilizationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        UtilizationError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
        UtilizationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for UtilizationError {
    fn into_response(self) -> Response {
        (
            status_code(&self),
            Json(ErrorResponse {
                error: self.to_string(),
                code: self.code().to_string(),
            }),
        )
            .into_response()
    }
}

/// Handler for GET /{subscriptionId}/ComputeUtilization/{location}/{vmType}
pub async fn compute_utilization_handler(
    State(state): State<ServerState>,
    Path((subscription_id, location, vm_type)): Path<(Uuid, String, String)>,
) -> Result<Json<ComputeUtilizationResponse>, UtilizationError> {
    log::info!("ComputeUtilization processing {vm_type} in {location} for {subscription_id}");

    let response = state
        .aggregator()
        .compute_utilization(subscription_id, &location, &vm_type)
        .await
        .map_err(|e| {
            log::error!("ComputeUtilization {vm_type} in {location} failed: {e}");
            e
        })?;

    log::info!("ComputeUtilization processed {vm_type} in {location} for {subscription_id}");
    Ok(Json(response))
}
