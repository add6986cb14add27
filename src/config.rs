use serde::{Deserialize, Serialize};

use crate::errors::{CrmError, Result};
use crate::types::ServiceInterval;

/// label used when an imported row has no brand or model
pub const UNKNOWN_LABEL: &str = "Unknown";

/// library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrmConfig {
    pub derivation: DerivationConfig,
    pub revenue: RevenueConfig,
    pub reminders: ReminderConfig,
    pub import: ImportConfig,
}

/// warranty and AMC policy inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// months after installation during which the appliance is in warranty
    pub warranty_period_months: u32,
    /// trailing days before contract end reported as pending renewal
    pub pending_renewal_window_days: u32,
}

/// revenue reporting windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueConfig {
    /// trailing months covered by the per-customer breakdown
    pub customer_breakdown_months: u32,
}

/// dashboard lookahead windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// days after today listed as upcoming reminders
    pub upcoming_window_days: u32,
    /// days ahead listed as upcoming services
    pub upcoming_service_window_days: u32,
}

/// defaults applied to imported rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub default_service_interval: ServiceInterval,
    pub default_brand: String,
    pub default_model: String,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            warranty_period_months: 12,
            pending_renewal_window_days: 30,
        }
    }
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            customer_breakdown_months: 12,
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: 7,
            upcoming_service_window_days: 30,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_service_interval: ServiceInterval::ThreeMonths,
            default_brand: UNKNOWN_LABEL.to_string(),
            default_model: UNKNOWN_LABEL.to_string(),
        }
    }
}

impl CrmConfig {
    /// load from json; missing sections and fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CrmConfig = serde_json::from_str(json).map_err(|e| CrmError::InvalidConfiguration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_warranty_period_months(mut self, months: u32) -> Self {
        self.derivation.warranty_period_months = months;
        self
    }

    pub fn with_pending_renewal_window_days(mut self, days: u32) -> Self {
        self.derivation.pending_renewal_window_days = days;
        self
    }

    pub fn with_customer_breakdown_months(mut self, months: u32) -> Self {
        self.revenue.customer_breakdown_months = months;
        self
    }

    pub fn with_upcoming_window_days(mut self, days: u32) -> Self {
        self.reminders.upcoming_window_days = days;
        self
    }

    pub fn with_default_service_interval(mut self, interval: ServiceInterval) -> Self {
        self.import.default_service_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.derivation.warranty_period_months == 0 {
            return Err(CrmError::InvalidConfiguration {
                message: "warranty_period_months must be at least 1".to_string(),
            });
        }
        if self.derivation.pending_renewal_window_days > 366 {
            return Err(CrmError::InvalidConfiguration {
                message: format!(
                    "pending_renewal_window_days {} exceeds one year",
                    self.derivation.pending_renewal_window_days
                ),
            });
        }
        if self.revenue.customer_breakdown_months == 0 {
            return Err(CrmError::InvalidConfiguration {
                message: "customer_breakdown_months must be at least 1".to_string(),
            });
        }
        if self.import.default_brand.trim().is_empty() || self.import.default_model.trim().is_empty() {
            return Err(CrmError::InvalidConfiguration {
                message: "default brand and model labels cannot be blank".to_string(),
            });
        }
        Ok(())
    }
}
