//! Announcement systems: one configuration record per recorded voice pack.
//!
//! A system bundles its inventory, rule set, file prefix, presets and fixed
//! buttons. [`SystemId`] selects one; the engine itself is generic.

pub mod atos_anne;

use crate::error::{Result, TannoyError};
use crate::inventory::{InventoryEntry, InventoryIndex};
use crate::request::AnnouncementRequest;
use crate::rules::{AnnouncementPlan, RuleSet};
use crate::segments::SegmentRef;
use crate::validate::validate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known announcement systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemId {
    AtosAnne,
}

impl SystemId {
    pub const ALL: &'static [SystemId] = &[SystemId::AtosAnne];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemId::AtosAnne => "atos-anne",
        }
    }

    /// Build the configuration record for this system.
    pub fn system(self) -> AnnouncementSystem {
        match self {
            SystemId::AtosAnne => atos_anne::system(),
        }
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemId {
    type Err = TannoyError;

    fn from_str(s: &str) -> Result<Self> {
        SystemId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TannoyError::UnknownSystem { id: s.to_string() })
    }
}

/// Where the voice pack is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    Station,
    Train,
}

/// A saved request offered to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub request: AnnouncementRequest,
}

/// A one-press announcement with a fixed clip list.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementButton {
    pub label: &'static str,
    pub segments: Vec<SegmentRef>,
}

/// Configuration record of one voice pack.
#[derive(Debug, Clone)]
pub struct AnnouncementSystem {
    pub id: SystemId,
    pub name: &'static str,
    pub code: &'static str,
    pub kind: SystemKind,
    /// Locator prefix for every clip that doesn't override it.
    pub file_prefix: &'static str,
    pub inventory: InventoryIndex,
    pub rules: RuleSet,
    pub presets: Vec<Preset>,
    pub buttons: Vec<AnnouncementButton>,
}

impl AnnouncementSystem {
    /// Run the system's rule function for a request.
    ///
    /// # Errors
    /// `UnsupportedAnnouncement` when the system has no rule for the request
    /// type, `UnknownButton` for an unconfigured button label.
    pub fn plan(&self, request: &AnnouncementRequest) -> Result<AnnouncementPlan> {
        let unsupported = || TannoyError::UnsupportedAnnouncement {
            system: self.name.to_string(),
            kind: request.kind().to_string(),
        };

        match request {
            AnnouncementRequest::NextTrain(r) => {
                Ok((self.rules.next_train.ok_or_else(unsupported)?)(r))
            }
            AnnouncementRequest::ThroughTrain(r) => {
                Ok((self.rules.through_train.ok_or_else(unsupported)?)(r))
            }
            AnnouncementRequest::DisruptedTrain(r) => {
                Ok((self.rules.disrupted_train.ok_or_else(unsupported)?)(r))
            }
            AnnouncementRequest::Button { label } => {
                let button = self.button(label)?;
                Ok(AnnouncementPlan::fixed(button.segments.clone()))
            }
            AnnouncementRequest::Segments { segments } => {
                Ok(AnnouncementPlan::raw(segments.clone()))
            }
        }
    }

    /// Inventory entries a request needs, in the order validation checks them.
    pub fn required_checks(&self, request: &AnnouncementRequest) -> Result<Vec<InventoryEntry>> {
        Ok(self.plan(request)?.checks().to_vec())
    }

    /// Validate a request and return its clip sequence.
    ///
    /// # Errors
    /// `InvalidSegment` for a clip that would resolve outside the clip root,
    /// `MissingInventoryEntry` with the first missing entry in check order.
    pub fn build(&self, request: &AnnouncementRequest) -> Result<Vec<SegmentRef>> {
        let plan = self.plan(request)?;
        for segment in plan.segments() {
            segment.check_path()?;
        }
        validate(&self.inventory, plan.checks())?;
        Ok(plan.into_segments())
    }

    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TannoyError::UnknownPreset {
                system: self.name.to_string(),
                name: name.to_string(),
            })
    }

    pub fn button(&self, label: &str) -> Result<&AnnouncementButton> {
        self.buttons
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(label))
            .ok_or_else(|| TannoyError::UnknownButton {
                system: self.name.to_string(),
                label: label.to_string(),
            })
    }
}
