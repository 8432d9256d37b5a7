//! SIP Configuration

use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};
use crate::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SipConfig {
    /// Amount invested on the first trading day of each month (default: 100)
    pub amount: Money,
}

impl Default for SipConfig {
    fn default() -> Self {
        Self {
            amount: Money::from_i64(100),
        }
    }
}

impl SipConfig {
    pub fn validate(&self) -> DcaResult<()> {
        if self.amount.is_negative() {
            return Err(DcaError::NegativeAmount(self.amount));
        }
        Ok(())
    }
}
