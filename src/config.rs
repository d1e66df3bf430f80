//! Conversion settings

use serde::{Deserialize, Serialize};

/// How row failures are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort at the first offending row
    FailFast,
    /// Normalize every row, then report all row errors together
    CollectAll,
}

/// Settings for one converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// chrono formats tried in order for the transaction date
    pub date_formats: Vec<String>,
    /// chrono format for the transaction time
    pub time_format: String,
    /// Prefix stripped from descriptions to obtain the vendor
    pub vendor_prefix: Option<String>,
    /// Vendor label used when the description is blank
    pub default_vendor: String,
    pub error_policy: ErrorPolicy,
    /// Sort movements by (date, time) before reconciliation
    pub sort_chronologically: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%m-%d-%Y".to_string(),
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
            ],
            time_format: "%H:%M:%S".to_string(),
            vendor_prefix: Some("Payment from ".to_string()),
            default_vendor: "Unknown".to_string(),
            error_policy: ErrorPolicy::FailFast,
            sort_chronologically: true,
        }
    }
}

impl ConversionConfig {
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_date_formats(mut self, formats: Vec<String>) -> Self {
        self.date_formats = formats;
        self
    }

    pub fn with_vendor_prefix(mut self, prefix: Option<String>) -> Self {
        self.vendor_prefix = prefix;
        self
    }

    pub fn with_default_vendor(mut self, vendor: String) -> Self {
        self.default_vendor = vendor;
        self
    }

    pub fn with_sorting(mut self, sort_chronologically: bool) -> Self {
        self.sort_chronologically = sort_chronologically;
        self
    }
}
