//! Strongly typed announcement requests.
//!
//! The presentation layer hands these over already shaped per announcement
//! type. The `"none"` / `"unknown"` sentinels used by form selects are folded
//! into `None` while deserializing, so the rule functions never see them.

use crate::defaults::{NONE_SENTINEL, UNKNOWN_SENTINEL};
use crate::error::{Result, TannoyError};
use crate::segments::SegmentRef;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// "Platform 1 for the 07:11 Thameslink service to Cambridge, calling at ..."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTrainRequest {
    pub platform: String,
    pub hour: String,
    #[serde(rename = "min")]
    pub minute: String,
    pub toc: String,
    pub terminating_station_code: String,
    #[serde(default, deserialize_with = "sentinel_opt")]
    pub via: Option<String>,
    #[serde(default, deserialize_with = "station_codes")]
    pub calling_at: Vec<String>,
    pub coaches: String,
}

/// "The train now approaching platform 3 does not stop here."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughTrainRequest {
    pub platform: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisruptionType {
    #[default]
    Delayed,
    Cancelled,
}

/// Faster service offered to passengers of a disrupted train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeService {
    pub hour: String,
    pub minute: String,
    pub platform: String,
    pub terminating_crs: String,
    #[serde(default, deserialize_with = "sentinel_opt")]
    pub via: Option<String>,
    #[serde(default, deserialize_with = "station_codes")]
    pub passengers_for: Vec<String>,
}

/// "We are sorry that the 07:11 Thameslink service to Cambridge is delayed ..."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisruptedTrainRequest {
    pub hour: String,
    #[serde(rename = "min")]
    pub minute: String,
    pub toc: String,
    pub terminating_station_code: String,
    #[serde(default, deserialize_with = "sentinel_opt")]
    pub via: Option<String>,
    /// Delay in minutes; `None` when unknown.
    #[serde(default, deserialize_with = "sentinel_opt")]
    pub delay_time: Option<String>,
    /// `None` when unknown.
    #[serde(default, deserialize_with = "sentinel_opt")]
    pub disruption_reason: Option<String>,
    #[serde(default)]
    pub disruption_type: DisruptionType,
    /// Only announced for cancellations.
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub alternative_services: Vec<AlternativeService>,
}

/// One announcement instance, tagged by announcement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnnouncementRequest {
    NextTrain(NextTrainRequest),
    ThroughTrain(ThroughTrainRequest),
    DisruptedTrain(DisruptedTrainRequest),
    /// A fixed announcement button configured on the system.
    Button { label: String },
    /// A raw clip sequence. Category clips are still checked against the
    /// inventory and every clip path must stay under the clip root.
    Segments { segments: Vec<SegmentRef> },
}

impl AnnouncementRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AnnouncementRequest::NextTrain(_) => "next-train",
            AnnouncementRequest::ThroughTrain(_) => "through-train",
            AnnouncementRequest::DisruptedTrain(_) => "disrupted-train",
            AnnouncementRequest::Button { .. } => "button",
            AnnouncementRequest::Segments { .. } => "segments",
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TannoyError::RequestParse {
            message: e.to_string(),
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| TannoyError::RequestParse {
            message: e.to_string(),
        })
    }

    /// Load a request from a `.json` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_json(&contents),
        }
    }
}

impl From<NextTrainRequest> for AnnouncementRequest {
    fn from(request: NextTrainRequest) -> Self {
        AnnouncementRequest::NextTrain(request)
    }
}

impl From<ThroughTrainRequest> for AnnouncementRequest {
    fn from(request: ThroughTrainRequest) -> Self {
        AnnouncementRequest::ThroughTrain(request)
    }
}

impl From<DisruptedTrainRequest> for AnnouncementRequest {
    fn from(request: DisruptedTrainRequest) -> Self {
        AnnouncementRequest::DisruptedTrain(request)
    }
}

/// Fold a form sentinel (`none`, `unknown`, empty) into `None`.
pub fn parse_sentinel(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case(NONE_SENTINEL)
        || trimmed.eq_ignore_ascii_case(UNKNOWN_SENTINEL)
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn sentinel_opt<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_sentinel))
}

/// Station lists arrive either as bare CRS codes or as picker items.
#[derive(Deserialize)]
#[serde(untagged)]
enum StationItem {
    Code(String),
    #[serde(rename_all = "camelCase")]
    Item { crs_code: String },
}

fn station_codes<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<StationItem>::deserialize(deserializer)?;
    Ok(items
        .into_iter()
        .map(|item| match item {
            StationItem::Code(code) => code,
            StationItem::Item { crs_code } => crs_code,
        })
        .collect())
}
