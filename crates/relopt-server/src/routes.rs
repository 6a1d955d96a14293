//! # HTTP Route Handlers
//!
//! Each request builds its own catalogue from the body and runs against a fresh
//! memo; handlers share nothing but the server configuration.
//!
//! ## Error Handling
//!
//! Errors are returned as HTTP status codes with descriptive messages:
//! - 400 Bad Request: malformed catalogue, unknown relation or attribute
//! - 422 Unprocessable Entity: plan scans more relations than the server allows
//! - 500 Internal Server Error: the search produced no plan

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::debug;

use relopt_core::catalog::InMemoryCatalog;
use relopt_core::{estimate_plan, OptimiseError, Optimiser};

use crate::state::AppState;
use crate::wire::{build_catalog, EstimateResponse, HealthResponse, OptimiseResponse, PlanRequest};

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /estimate: annotate the plan as written with estimated statistics.
pub async fn estimate(
    Json(req): Json<PlanRequest>,
) -> Result<Json<EstimateResponse>, (StatusCode, String)> {
    let catalog = catalog_from(&req)?;
    let estimated = estimate_plan(&catalog, &req.plan).map_err(error_response)?;
    debug!("Estimated plan {}: T={}", req.plan, estimated.relation.tuple_count);

    Ok(Json(EstimateResponse {
        rendered: estimated.display(),
        relation: estimated.relation,
    }))
}

/// POST /optimise: rewrite the plan into the cheapest equivalent left-deep plan.
pub async fn optimise(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<OptimiseResponse>, (StatusCode, String)> {
    let catalog = catalog_from(&req)?;
    let optimised = Optimiser::new(&catalog, state.config.optimiser.clone())
        .optimise(&req.plan)
        .map_err(error_response)?;

    let plan = optimised.plan();
    debug!("Optimised {} into {}", req.plan, plan);

    Ok(Json(OptimiseResponse {
        plan,
        rendered: optimised.display(),
        relation: optimised.relation,
        unenforced: optimised.unenforced,
        cost: optimised.cost.0,
        candidates: optimised.candidates,
    }))
}

fn catalog_from(req: &PlanRequest) -> Result<InMemoryCatalog, (StatusCode, String)> {
    build_catalog(&req.catalog)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid catalogue: {}", e)))
}

fn error_response(err: OptimiseError) -> (StatusCode, String) {
    let status = match err {
        OptimiseError::Estimate(_) => StatusCode::BAD_REQUEST,
        OptimiseError::TooManyRelations { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OptimiseError::EmptyPlan => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
