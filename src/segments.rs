//! Segment references and the list primitives shared by every rule set.

use crate::defaults;
use crate::error::{Result, TannoyError};
use crate::inventory::InventoryEntry;
use serde::{Deserialize, Serialize};

/// Reference to one recorded clip inside an announcement.
///
/// `delay_ms` is the silence inserted before the clip. `prefix` replaces the
/// system's file prefix for this clip only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    delay_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl SegmentRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delay_ms: 0,
            prefix: None,
        }
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Reject ids and prefixes that would resolve outside the clip root.
    ///
    /// # Errors
    /// `InvalidSegment` for an empty id, an id with path separators, or an
    /// absolute or `..` prefix.
    pub fn check_path(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(TannoyError::InvalidSegment {
                id: self.id.clone(),
                message: message.to_string(),
            })
        };

        if self.id.trim().is_empty() {
            return invalid("empty clip id");
        }
        if self.id.contains(['/', '\\']) {
            return invalid("clip ids are separated with '.', not slashes");
        }
        if let Some(prefix) = &self.prefix {
            if prefix.starts_with(['/', '\\']) {
                return invalid("prefix must be relative to the clip root");
            }
            if prefix.split(['/', '\\']).any(|part| part == "..") {
                return invalid("prefix must not contain '..'");
            }
        }
        Ok(())
    }

    fn prefixed_id(mut self, id_prefix: &str) -> Self {
        self.id = format!("{id_prefix}{}", self.id);
        self
    }
}

impl From<&str> for SegmentRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SegmentRef {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&InventoryEntry> for SegmentRef {
    fn from(entry: &InventoryEntry) -> Self {
        Self::new(entry.segment_id())
    }
}

/// How [`pluralise`] joins a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluraliseOptions {
    /// Clip inserted before the final item.
    pub and_id: String,
    /// Prepended to the id of every item except the last.
    pub prefix: Option<String>,
    /// Prepended to the id of the last item.
    pub final_prefix: Option<String>,
}

impl Default for PluraliseOptions {
    fn default() -> Self {
        Self {
            and_id: defaults::AND_ID.to_string(),
            prefix: None,
            final_prefix: None,
        }
    }
}

/// Join a list of clips the way it is spoken: `a, b and c`.
///
/// Lists of two or more items get exactly one joiner clip, carrying
/// `delay_ms`, right before the final item. Shorter lists come back as-is
/// apart from the configured id prefixes.
pub fn pluralise(items: Vec<SegmentRef>, delay_ms: u32, options: &PluraliseOptions) -> Vec<SegmentRef> {
    let last = items.len().saturating_sub(1);
    let mut items: Vec<SegmentRef> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let id_prefix = if i == last {
                options.final_prefix.as_deref()
            } else {
                options.prefix.as_deref()
            };
            match id_prefix {
                Some(p) => item.prefixed_id(p),
                None => item,
            }
        })
        .collect();

    if items.len() > 1 {
        items.insert(
            last,
            SegmentRef::new(options.and_id.as_str()).with_delay(delay_ms),
        );
    }

    items
}
