use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catch report as captured on the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatchReport {
    pub trip_id: String,
    pub date: NaiveDate,
    pub no_catch: bool,
    pub imei: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fish_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fish_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

impl CatchReport {
    pub fn validate(&self) -> Result<(), String> {
        if self.trip_id.trim().is_empty() {
            return Err("Trip ID is required".to_string());
        }
        if self.imei.trim().is_empty() {
            return Err("IMEI is required".to_string());
        }
        if !self.no_catch {
            let group = self.fish_group.as_deref().map(str::trim).unwrap_or_default();
            if group.is_empty() {
                return Err("Fish group is required when a catch was made".to_string());
            }
            if self.quantity.unwrap_or(0) == 0 {
                return Err("Quantity must be greater than 0 when a catch was made".to_string());
            }
        }
        if let Some(length) = self.fish_length
            && (!length.is_finite() || length < 0.0)
        {
            return Err("Fish length must be a non-negative number".to_string());
        }
        Ok(())
    }

    /// `catch_outcome` as the remote API expects it: 1 when something was caught.
    pub fn catch_outcome(&self) -> u8 {
        if self.no_catch { 0 } else { 1 }
    }
}
