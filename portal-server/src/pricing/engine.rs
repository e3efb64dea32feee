//! Quote Engine
//!
//! Deterministic pricing of a custom VPS configuration against the
//! admin-configured rate table. Uses rust_decimal internally; monetary
//! results are rounded to 2 decimal places only at the response
//! boundary, so the discount/multiply chain never compounds rounding
//! error.
//!
//! Out-of-bound or off-step resource values are rejected, never
//! clamped — clamping would let a client under-report the price of
//! what they actually ordered.

use rust_decimal::prelude::*;
use shared::models::{BillingTerm, PricingConfig, Quote, ResourceBounds, VpsConfig};
use thiserror::Error;

use crate::utils::AppError;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for the response, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validation failures for a requested configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must step by {step} from {min}, got {value}")]
    OffStep {
        field: &'static str,
        value: i64,
        min: i64,
        step: i64,
    },

    #[error("Unknown datacenter: {0}")]
    UnknownDatacenter(String),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::validation(err.to_string())
    }
}

fn check_bounds(
    field: &'static str,
    value: i64,
    bounds: &ResourceBounds,
) -> Result<(), PricingError> {
    if value < bounds.min || value > bounds.max {
        return Err(PricingError::OutOfBounds {
            field,
            value,
            min: bounds.min,
            max: bounds.max,
        });
    }
    let step = bounds.step.max(1);
    if (value - bounds.min) % step != 0 {
        return Err(PricingError::OffStep {
            field,
            value,
            min: bounds.min,
            step,
        });
    }
    Ok(())
}

/// Validate a requested configuration against the configured bounds
pub fn validate(config: &PricingConfig, request: &VpsConfig) -> Result<(), PricingError> {
    check_bounds("cores", request.cores, &config.cores_bounds)?;
    check_bounds("ram_gb", request.ram_gb, &config.ram_bounds)?;
    check_bounds("storage_gb", request.storage_gb, &config.storage_bounds)?;
    check_bounds("bandwidth_tb", request.bandwidth_tb, &config.bandwidth_bounds)?;
    // backup_gb = 0 means "no backup" and bypasses the bounds check
    if request.backup_gb != 0 {
        check_bounds("backup_gb", request.backup_gb, &config.backup_bounds)?;
    }
    if !config.datacenters.iter().any(|dc| dc.id == request.datacenter) {
        return Err(PricingError::UnknownDatacenter(request.datacenter.clone()));
    }
    Ok(())
}

/// Undiscounted monthly price for a configuration
fn monthly_base(config: &PricingConfig, request: &VpsConfig) -> Decimal {
    let mut total = Decimal::from(request.cores) * to_decimal(config.price_per_core)
        + Decimal::from(request.ram_gb) * to_decimal(config.price_per_ram_gb)
        + Decimal::from(request.storage_gb) * to_decimal(config.price_per_storage_gb)
        + Decimal::from(request.bandwidth_tb) * to_decimal(config.price_per_bandwidth_tb)
        + Decimal::from(request.backup_gb) * to_decimal(config.price_per_backup_gb);

    if request.ddos_protection {
        total += to_decimal(config.ddos_price);
    }
    if request.control_panel {
        total += to_decimal(config.control_panel_price);
    }
    if request.managed_support {
        total += to_decimal(config.managed_price);
    }

    total
}

/// Compute the quote for a validated configuration.
///
/// Discount percentages are taken as configured; the engine does not
/// bound them (the admin UI constrains the editable range).
pub fn quote(config: &PricingConfig, request: &VpsConfig) -> Result<Quote, PricingError> {
    validate(config, request)?;

    let base = monthly_base(config, request);
    let discount_percent = config.discount_percent(request.billing_term);
    let term_months = request.billing_term.months();

    let discount_multiplier =
        Decimal::ONE - to_decimal(discount_percent) / Decimal::ONE_HUNDRED;
    let monthly_effective = base * discount_multiplier;
    let total_for_term = monthly_effective * Decimal::from(term_months);

    Ok(Quote {
        monthly_base: to_f64(base),
        monthly_effective: to_f64(monthly_effective),
        total_for_term: to_f64(total_for_term),
        term_months,
        discount_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VpsConfig {
        VpsConfig {
            cores: 4,
            ram_gb: 8,
            storage_gb: 100,
            bandwidth_tb: 5,
            backup_gb: 50,
            ddos_protection: false,
            control_panel: false,
            managed_support: false,
            billing_term: BillingTerm::Monthly,
            datacenter: "ams1".to_string(),
        }
    }

    #[test]
    fn test_default_rates_example() {
        // 4·3.00 + 8·1.50 + 100·0.05 + 5·1.00 + 50·0.05 = 36.50
        let config = PricingConfig::default();
        let quote = quote(&config, &request()).unwrap();

        assert_eq!(quote.monthly_base, 36.50);
        assert_eq!(quote.monthly_effective, 36.50);
        assert_eq!(quote.total_for_term, 36.50);
        assert_eq!(quote.term_months, 1);
    }

    #[test]
    fn test_one_year_discount() {
        // 10% one-year discount: 36.50 → 32.85 monthly, 394.20 per term
        let config = PricingConfig::default();
        let mut req = request();
        req.billing_term = BillingTerm::OneYear;

        let quote = quote(&config, &req).unwrap();
        assert_eq!(quote.monthly_base, 36.50);
        assert_eq!(quote.monthly_effective, 32.85);
        assert_eq!(quote.total_for_term, 394.20);
        assert_eq!(quote.term_months, 12);
        assert_eq!(quote.discount_percent, 10.0);
    }

    #[test]
    fn test_addons_are_flat() {
        let config = PricingConfig::default();
        let mut req = request();
        req.ddos_protection = true;
        req.control_panel = true;
        req.managed_support = true;

        let q = quote(&config, &req).unwrap();
        // 36.50 + 5 + 8 + 25
        assert_eq!(q.monthly_base, 74.50);
    }

    #[test]
    fn test_zero_backup_means_none() {
        let config = PricingConfig::default();
        let mut req = request();
        req.backup_gb = 0; // below backup_bounds.min, still valid

        let q = quote(&config, &req).unwrap();
        assert_eq!(q.monthly_base, 34.00);
    }

    // ========== Validation ==========

    #[test]
    fn test_out_of_bounds_rejected_not_clamped() {
        let config = PricingConfig::default();

        let mut req = request();
        req.cores = 0;
        assert!(matches!(
            quote(&config, &req),
            Err(PricingError::OutOfBounds { field: "cores", .. })
        ));

        let mut req = request();
        req.ram_gb = 1000;
        assert!(matches!(
            quote(&config, &req),
            Err(PricingError::OutOfBounds { field: "ram_gb", .. })
        ));
    }

    #[test]
    fn test_off_step_rejected() {
        let config = PricingConfig::default();
        let mut req = request();
        req.storage_gb = 105; // storage steps by 10 from 10
        assert!(matches!(
            quote(&config, &req),
            Err(PricingError::OffStep { field: "storage_gb", .. })
        ));
    }

    #[test]
    fn test_off_step_backup_rejected() {
        let config = PricingConfig::default();
        let mut req = request();
        req.backup_gb = 75; // backup steps by 50 from 50
        assert!(quote(&config, &req).is_err());
    }

    #[test]
    fn test_unknown_datacenter_rejected() {
        let config = PricingConfig::default();
        let mut req = request();
        req.datacenter = "mars1".to_string();
        assert_eq!(
            quote(&config, &req),
            Err(PricingError::UnknownDatacenter("mars1".to_string()))
        );
    }

    // ========== Monotonicity ==========

    #[test]
    fn test_each_resource_strictly_increases_price() {
        let config = PricingConfig::default();
        let base = quote(&config, &request()).unwrap().monthly_base;

        let bump = |f: &dyn Fn(&mut VpsConfig)| {
            let mut req = request();
            f(&mut req);
            quote(&config, &req).unwrap().monthly_base
        };

        assert!(bump(&|r| r.cores += 1) > base);
        assert!(bump(&|r| r.ram_gb += 1) > base);
        assert!(bump(&|r| r.storage_gb += 10) > base);
        assert!(bump(&|r| r.bandwidth_tb += 1) > base);
        assert!(bump(&|r| r.backup_gb += 50) > base);
    }

    #[test]
    fn test_longer_terms_cost_less_per_month() {
        let config = PricingConfig::default();

        let monthly_at = |term: BillingTerm| {
            let mut req = request();
            req.billing_term = term;
            quote(&config, &req).unwrap().monthly_effective
        };

        let monthly = monthly_at(BillingTerm::Monthly);
        let one = monthly_at(BillingTerm::OneYear);
        let two = monthly_at(BillingTerm::TwoYears);
        let three = monthly_at(BillingTerm::ThreeYears);

        assert!(one < monthly);
        assert!(two < one);
        assert!(three < two);
    }

    // ========== Precision ==========

    #[test]
    fn test_rounding_only_at_the_edge() {
        // 33% discount over 36 months: intermediate values stay exact
        // in Decimal, rounding happens once per response field
        let mut config = PricingConfig::default();
        config.discount_three_years_percent = 33.0;

        let mut req = request();
        req.billing_term = BillingTerm::ThreeYears;

        let q = quote(&config, &req).unwrap();
        // 36.50 · 0.67 = 24.455 → 24.46 (display); total = 36.50 · 0.67 · 36 = 880.38
        assert_eq!(q.monthly_effective, 24.46);
        assert_eq!(q.total_for_term, 880.38);
    }

    #[test]
    fn test_permissive_discounts_not_bounded() {
        // Negative discount prices a surcharge; > 100 goes negative.
        // Admin-trusted input, deliberately not rejected here.
        let mut config = PricingConfig::default();
        config.discount_one_year_percent = -10.0;

        let mut req = request();
        req.billing_term = BillingTerm::OneYear;
        let q = quote(&config, &req).unwrap();
        assert_eq!(q.monthly_effective, 40.15);

        config.discount_one_year_percent = 150.0;
        let q = quote(&config, &req).unwrap();
        assert!(q.total_for_term < 0.0);
    }

    #[test]
    fn test_missing_config_fields_fall_back_to_defaults() {
        let config: PricingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PricingConfig::default());

        let partial: PricingConfig =
            serde_json::from_str(r#"{"price_per_core": 4.5}"#).unwrap();
        assert_eq!(partial.price_per_core, 4.5);
        assert_eq!(partial.price_per_ram_gb, 1.50);
    }
}
