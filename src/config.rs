use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::ConfigError;
use crate::late_fee::LateFeePolicy;
use crate::ledger::PaymentWaterfall;

/// engine-wide knobs, loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// days after a due date before overdue months start counting
    #[serde(default)]
    pub late_fee_grace_days: u32,

    /// how far a legacy amount may be from a plan amount and still match, in display units
    #[serde(default = "default_reclassification_tolerance")]
    pub reclassification_tolerance: Decimal,

    /// rayon pool size for the sweep; `None` uses the global pool
    #[serde(default)]
    pub sweep_max_threads: Option<usize>,

    #[serde(default)]
    pub payment_waterfall: PaymentWaterfall,
}

fn default_reclassification_tolerance() -> Decimal {
    dec!(1.00)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            late_fee_grace_days: 0,
            reclassification_tolerance: default_reclassification_tolerance(),
            sweep_max_threads: None,
            payment_waterfall: PaymentWaterfall::default(),
        }
    }
}

impl EngineConfig {
    /// parse and validate a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reclassification_tolerance.is_sign_negative() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "reclassification_tolerance must not be negative, got {}",
                    self.reclassification_tolerance
                ),
            });
        }

        if self.tolerance().is_none() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "reclassification_tolerance {} is not a whole number of minor units",
                    self.reclassification_tolerance
                ),
            });
        }

        if self.sweep_max_threads == Some(0) {
            return Err(ConfigError::Invalid {
                message: "sweep_max_threads must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn late_fee_policy(&self) -> LateFeePolicy {
        LateFeePolicy::new().with_grace_period_days(self.late_fee_grace_days)
    }

    /// tolerance in minor units
    pub fn tolerance(&self) -> Option<Money> {
        Money::try_from_decimal(self.reclassification_tolerance)
    }
}
