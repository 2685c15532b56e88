//! Rule-set plumbing shared by every announcement system.
//!
//! A rule function turns one typed request into an [`AnnouncementPlan`]: the
//! ordered inventory checks the request needs, and the clip sequence that will
//! be spoken once those checks pass. Building both in one place keeps every
//! emitted station/platform/time clip covered by a check.

use crate::inventory::{Category, InventoryEntry, Variant};
use crate::request::{DisruptedTrainRequest, NextTrainRequest, ThroughTrainRequest};
use crate::segments::SegmentRef;
use crate::validate::CheckGroup;

/// Checks plus clip sequence for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncementPlan {
    checks: Vec<InventoryEntry>,
    segments: Vec<SegmentRef>,
}

impl AnnouncementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan for a fixed clip list that needs no inventory checks.
    pub fn fixed(segments: Vec<SegmentRef>) -> Self {
        Self {
            checks: Vec::new(),
            segments,
        }
    }

    /// Plan for a caller-supplied clip list.
    ///
    /// Clips in a category namespace (stations, platforms, times...) are
    /// checked against the inventory; fixed phrases and clips under another
    /// prefix are not.
    pub fn raw(segments: Vec<SegmentRef>) -> Self {
        let checks = segments
            .iter()
            .filter(|segment| segment.prefix().is_none())
            .filter_map(|segment| InventoryEntry::from_segment_id(segment.id()))
            .collect();
        Self { checks, segments }
    }

    /// Append a group of checks.
    pub fn check(&mut self, group: CheckGroup) {
        self.checks.extend(group.into_entries());
    }

    pub fn say(&mut self, segment: impl Into<SegmentRef>) {
        self.segments.push(segment.into());
    }

    pub fn say_all<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<SegmentRef>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
    }

    pub fn checks(&self) -> &[InventoryEntry] {
        &self.checks
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<SegmentRef> {
        self.segments
    }
}

pub type NextTrainRule = fn(&NextTrainRequest) -> AnnouncementPlan;
pub type ThroughTrainRule = fn(&ThroughTrainRequest) -> AnnouncementPlan;
pub type DisruptedTrainRule = fn(&DisruptedTrainRequest) -> AnnouncementPlan;

/// Rule functions of one announcement system. `None` marks an announcement
/// type the system has no recordings for.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSet {
    pub next_train: Option<NextTrainRule>,
    pub through_train: Option<ThroughTrainRule>,
    pub disrupted_train: Option<DisruptedTrainRule>,
}

pub fn station(variant: Variant, crs: &str) -> SegmentRef {
    SegmentRef::from(&InventoryEntry::station(variant, crs))
}

pub fn platform(variant: Variant, number: &str) -> SegmentRef {
    SegmentRef::from(&InventoryEntry::platform(variant, number))
}

/// Clip for a non-variant category, e.g. `times.hour.07`.
pub fn clip(category: Category, key: &str) -> SegmentRef {
    SegmentRef::from(&InventoryEntry::new(category, None, key))
}
