//! Custom VPS Pricing
//!
//! [`engine`] computes quotes; the rate table persists as one settings
//! record and is loaded through [`load_or_init`].

pub mod engine;

pub use engine::{PricingError, quote};

use shared::models::PricingConfig;
use sqlx::SqlitePool;

use crate::db::repository::setting;
use crate::utils::{AppError, AppResult};

/// Settings key holding the rate table as opaque JSON
pub const PRICING_SETTING_KEY: &str = "pricing.custom_vps";

/// Load the rate table, creating it with defaults on first read.
/// A stored record with missing fields deserializes onto the same
/// defaults; an unreadable record degrades to defaults with a warning
/// rather than failing the quote path.
pub async fn load_or_init(pool: &SqlitePool) -> AppResult<PricingConfig> {
    match setting::get(pool, PRICING_SETTING_KEY).await? {
        Some(json) => match serde_json::from_str(&json) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, "Stored pricing config unreadable, using defaults");
                Ok(PricingConfig::default())
            }
        },
        None => {
            let config = PricingConfig::default();
            save(pool, &config).await?;
            tracing::info!("Pricing config initialized with defaults");
            Ok(config)
        }
    }
}

/// Overwrite the rate table wholesale
pub async fn save(pool: &SqlitePool, config: &PricingConfig) -> AppResult<()> {
    let json = serde_json::to_string(config)
        .map_err(|e| AppError::internal(format!("Failed to serialize pricing config: {e}")))?;
    setting::upsert(pool, PRICING_SETTING_KEY, &json).await?;
    Ok(())
}
