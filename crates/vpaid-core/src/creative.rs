//! Creative data and parameters supplied by the host at `initAd`

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `creativeData` argument of `initAd`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreativeData {
    /// JSON-encoded creative parameters
    #[serde(rename = "AdParameters", default, skip_serializing_if = "Option::is_none")]
    pub ad_parameters: Option<String>,
}

impl CreativeData {
    pub fn new(ad_parameters: impl Into<String>) -> Self {
        Self {
            ad_parameters: Some(ad_parameters.into()),
        }
    }

    /// Parse the ad parameters payload. An absent or empty payload yields
    /// empty parameters; a malformed one is an error.
    pub fn parameters(&self) -> Result<CreativeParameters> {
        match self.ad_parameters.as_deref() {
            Some(raw) if !raw.is_empty() => CreativeParameters::parse(raw),
            _ => Ok(CreativeParameters::default()),
        }
    }
}

/// Parsed creative parameters. Read-only after `initAd`.
///
/// Only `videoUrl` is consumed by the ad unit; every other field belongs to
/// the overlay and is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreativeParameters {
    #[serde(rename = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreativeParameters {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Look up an overlay field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
