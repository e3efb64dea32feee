//! Pricing API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::pricing;
use crate::utils::AppResult;
use shared::models::{PricingConfig, Quote, VpsConfig};

/// GET /api/pricing/config - Rate table and bounds for the configurator
pub async fn get_config(State(state): State<ServerState>) -> AppResult<Json<PricingConfig>> {
    let config = pricing::load_or_init(&state.pool).await?;
    Ok(Json(config))
}

/// PUT /api/pricing/config - Overwrite the rate table wholesale
pub async fn update_config(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
    Json(config): Json<PricingConfig>,
) -> AppResult<Json<PricingConfig>> {
    tracing::info!(user_id = %caller.user_id(), "Updating pricing config");

    pricing::save(&state.pool, &config).await?;
    Ok(Json(config))
}

/// POST /api/pricing/quote - Price a custom VPS configuration
pub async fn quote(
    State(state): State<ServerState>,
    Json(request): Json<VpsConfig>,
) -> AppResult<Json<Quote>> {
    let config = pricing::load_or_init(&state.pool).await?;
    let quote = pricing::quote(&config, &request)?;
    Ok(Json(quote))
}
