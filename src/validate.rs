//! Request validation against an [`InventoryIndex`].
//!
//! Validation is pure and synchronous: no clip is fetched until every check of
//! a request has passed. The first failing check in declared order is
//! reported, so the same request always yields the same error.

use crate::inventory::{Category, InventoryEntry, InventoryIndex, Variant};

/// Either valid, or the first entry missing from the inventory.
pub type ValidationResult = std::result::Result<(), InventoryEntry>;

/// Check every entry in order and stop at the first one not recorded.
pub fn validate(index: &InventoryIndex, checks: &[InventoryEntry]) -> ValidationResult {
    match checks.iter().find(|check| !index.contains(check)) {
        Some(missing) => Err(missing.clone()),
        None => Ok(()),
    }
}

/// One group of related checks.
///
/// Within a group the order is fixed: platform (low, high), hour, minute,
/// operator, number, coaches, delay time, disruption reason, stations (low,
/// high). Rule sets chain groups in the order the fields are spoken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckGroup {
    pub platform_low: Option<String>,
    pub platform_high: Option<String>,
    pub hour: Option<String>,
    pub minute: Option<String>,
    pub toc: Option<String>,
    pub number: Option<String>,
    pub coaches: Option<String>,
    pub delay_time: Option<String>,
    pub disruption_reason: Option<String>,
    pub stations_low: Vec<String>,
    pub stations_high: Vec<String>,
}

impl CheckGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform_low(mut self, platform: &str) -> Self {
        self.platform_low = Some(platform.to_string());
        self
    }

    pub fn platform_high(mut self, platform: &str) -> Self {
        self.platform_high = Some(platform.to_string());
        self
    }

    pub fn hour(mut self, hour: &str) -> Self {
        self.hour = Some(hour.to_string());
        self
    }

    pub fn minute(mut self, minute: &str) -> Self {
        self.minute = Some(minute.to_string());
        self
    }

    pub fn toc(mut self, toc: &str) -> Self {
        self.toc = Some(toc.to_string());
        self
    }

    pub fn number(mut self, number: &str) -> Self {
        self.number = Some(number.to_string());
        self
    }

    pub fn coaches(mut self, coaches: &str) -> Self {
        self.coaches = Some(coaches.to_string());
        self
    }

    pub fn delay_time(mut self, delay_time: Option<&str>) -> Self {
        self.delay_time = delay_time.map(str::to_string);
        self
    }

    pub fn disruption_reason(mut self, reason: Option<&str>) -> Self {
        self.disruption_reason = reason.map(str::to_string);
        self
    }

    pub fn stations_low<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stations_low
            .extend(stations.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn stations_high<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stations_high
            .extend(stations.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Flatten the group into inventory entries, in check order.
    pub fn into_entries(self) -> Vec<InventoryEntry> {
        let singles = [
            (Category::Platform, Some(Variant::Low), self.platform_low),
            (Category::Platform, Some(Variant::High), self.platform_high),
            (Category::Hour, None, self.hour),
            (Category::Minute, None, self.minute),
            (Category::Toc, None, self.toc),
            (Category::Number, None, self.number),
            (Category::Coaches, None, self.coaches),
            (Category::DelayTime, None, self.delay_time),
            (Category::DisruptionReason, None, self.disruption_reason),
        ];

        let mut entries: Vec<InventoryEntry> = singles
            .into_iter()
            .filter_map(|(category, variant, key)| {
                key.map(|k| InventoryEntry::new(category, variant, &k))
            })
            .collect();

        entries.extend(
            self.stations_low
                .iter()
                .map(|crs| InventoryEntry::station(Variant::Low, crs)),
        );
        entries.extend(
            self.stations_high
                .iter()
                .map(|crs| InventoryEntry::station(Variant::High, crs)),
        );
        entries
    }
}
