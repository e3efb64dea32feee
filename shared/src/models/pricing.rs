//! Custom VPS Pricing Models
//!
//! The rate table is admin-managed and persisted as a single settings
//! record, overwritten wholesale on each save. Every field carries a
//! serde default so a partially stored record (or an absent one) falls
//! back to the shipped rates instead of failing — a wrong price shown
//! before checkout beats a hard error here.

use serde::{Deserialize, Serialize};

/// Billing commitment length; determines the applied discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingTerm {
    Monthly,
    OneYear,
    TwoYears,
    ThreeYears,
}

impl BillingTerm {
    pub fn months(&self) -> u32 {
        match self {
            BillingTerm::Monthly => 1,
            BillingTerm::OneYear => 12,
            BillingTerm::TwoYears => 24,
            BillingTerm::ThreeYears => 36,
        }
    }
}

/// `{min, max, step}` triple bounding one numeric resource field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBounds {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl ResourceBounds {
    pub const fn new(min: i64, max: i64, step: i64) -> Self {
        Self { min, max, step }
    }
}

/// Selectable datacenter entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: String,
    pub name: String,
}

fn default_price_per_core() -> f64 {
    3.00
}
fn default_price_per_ram_gb() -> f64 {
    1.50
}
fn default_price_per_storage_gb() -> f64 {
    0.05
}
fn default_price_per_bandwidth_tb() -> f64 {
    1.00
}
fn default_price_per_backup_gb() -> f64 {
    0.05
}
fn default_ddos_price() -> f64 {
    5.00
}
fn default_control_panel_price() -> f64 {
    8.00
}
fn default_managed_price() -> f64 {
    25.00
}
fn default_discount_one_year() -> f64 {
    10.0
}
fn default_discount_two_years() -> f64 {
    20.0
}
fn default_discount_three_years() -> f64 {
    30.0
}
fn default_cores_bounds() -> ResourceBounds {
    ResourceBounds::new(1, 32, 1)
}
fn default_ram_bounds() -> ResourceBounds {
    ResourceBounds::new(1, 128, 1)
}
fn default_storage_bounds() -> ResourceBounds {
    ResourceBounds::new(10, 2000, 10)
}
fn default_bandwidth_bounds() -> ResourceBounds {
    ResourceBounds::new(1, 100, 1)
}
fn default_backup_bounds() -> ResourceBounds {
    ResourceBounds::new(50, 1000, 50)
}
fn default_datacenters() -> Vec<Datacenter> {
    vec![
        Datacenter {
            id: "ams1".to_string(),
            name: "Amsterdam".to_string(),
        },
        Datacenter {
            id: "fra1".to_string(),
            name: "Frankfurt".to_string(),
        },
        Datacenter {
            id: "nyc1".to_string(),
            name: "New York".to_string(),
        },
    ]
}

/// Admin-managed rate table for custom VPS configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    // Per-unit prices
    #[serde(default = "default_price_per_core")]
    pub price_per_core: f64,
    #[serde(default = "default_price_per_ram_gb")]
    pub price_per_ram_gb: f64,
    #[serde(default = "default_price_per_storage_gb")]
    pub price_per_storage_gb: f64,
    #[serde(default = "default_price_per_bandwidth_tb")]
    pub price_per_bandwidth_tb: f64,
    #[serde(default = "default_price_per_backup_gb")]
    pub price_per_backup_gb: f64,

    // Flat add-on prices
    #[serde(default = "default_ddos_price")]
    pub ddos_price: f64,
    #[serde(default = "default_control_panel_price")]
    pub control_panel_price: f64,
    #[serde(default = "default_managed_price")]
    pub managed_price: f64,

    // Whole-number percentage discounts per non-monthly term
    #[serde(default = "default_discount_one_year")]
    pub discount_one_year_percent: f64,
    #[serde(default = "default_discount_two_years")]
    pub discount_two_years_percent: f64,
    #[serde(default = "default_discount_three_years")]
    pub discount_three_years_percent: f64,

    // Per-resource bounds
    #[serde(default = "default_cores_bounds")]
    pub cores_bounds: ResourceBounds,
    #[serde(default = "default_ram_bounds")]
    pub ram_bounds: ResourceBounds,
    #[serde(default = "default_storage_bounds")]
    pub storage_bounds: ResourceBounds,
    #[serde(default = "default_bandwidth_bounds")]
    pub bandwidth_bounds: ResourceBounds,
    #[serde(default = "default_backup_bounds")]
    pub backup_bounds: ResourceBounds,

    #[serde(default = "default_datacenters")]
    pub datacenters: Vec<Datacenter>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_core: default_price_per_core(),
            price_per_ram_gb: default_price_per_ram_gb(),
            price_per_storage_gb: default_price_per_storage_gb(),
            price_per_bandwidth_tb: default_price_per_bandwidth_tb(),
            price_per_backup_gb: default_price_per_backup_gb(),
            ddos_price: default_ddos_price(),
            control_panel_price: default_control_panel_price(),
            managed_price: default_managed_price(),
            discount_one_year_percent: default_discount_one_year(),
            discount_two_years_percent: default_discount_two_years(),
            discount_three_years_percent: default_discount_three_years(),
            cores_bounds: default_cores_bounds(),
            ram_bounds: default_ram_bounds(),
            storage_bounds: default_storage_bounds(),
            bandwidth_bounds: default_bandwidth_bounds(),
            backup_bounds: default_backup_bounds(),
            datacenters: default_datacenters(),
        }
    }
}

impl PricingConfig {
    /// Discount percentage for a billing term (0 for monthly)
    pub fn discount_percent(&self, term: BillingTerm) -> f64 {
        match term {
            BillingTerm::Monthly => 0.0,
            BillingTerm::OneYear => self.discount_one_year_percent,
            BillingTerm::TwoYears => self.discount_two_years_percent,
            BillingTerm::ThreeYears => self.discount_three_years_percent,
        }
    }
}

/// Customer-chosen custom VPS configuration (transient — captured only
/// at quote/order time, never persisted as an entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpsConfig {
    pub cores: i64,
    pub ram_gb: i64,
    pub storage_gb: i64,
    pub bandwidth_tb: i64,
    /// Backup storage in GB, 0 = none
    #[serde(default)]
    pub backup_gb: i64,
    #[serde(default)]
    pub ddos_protection: bool,
    #[serde(default)]
    pub control_panel: bool,
    #[serde(default)]
    pub managed_support: bool,
    pub billing_term: BillingTerm,
    pub datacenter: String,
}

/// Computed quote; monetary fields are rounded to 2 decimal places at
/// this boundary only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub monthly_base: f64,
    pub monthly_effective: f64,
    pub total_for_term: f64,
    pub term_months: u32,
    pub discount_percent: f64,
}
