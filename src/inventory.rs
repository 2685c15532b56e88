//! Catalog of recorded clips.
//!
//! An [`InventoryIndex`] answers whether a `(category, variant, key)` triple has
//! a real recording behind it. Lookups are set-backed so large voice packs stay
//! O(1) per check.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Kind of recorded clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Platform,
    Hour,
    Minute,
    /// Train operating company. Keys are compared case-insensitively.
    Toc,
    Number,
    Coaches,
    DelayTime,
    DisruptionReason,
    Station,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Platform,
        Category::Hour,
        Category::Minute,
        Category::Toc,
        Category::Number,
        Category::Coaches,
        Category::DelayTime,
        Category::DisruptionReason,
        Category::Station,
    ];

    /// Namespace the category's clips live under.
    pub fn namespace(self) -> &'static str {
        match self {
            Category::Platform => "platforms",
            Category::Hour => "times.hour",
            Category::Minute => "times.mins",
            Category::Toc => "tocs",
            Category::Number => "numbers",
            Category::Coaches => "coaches",
            Category::DelayTime => "delay-times",
            Category::DisruptionReason => "disruption-reasons",
            Category::Station => "stations",
        }
    }

    fn normalise_key(self, key: &str) -> String {
        match self {
            Category::Toc => key.to_lowercase(),
            _ => key.to_string(),
        }
    }
}

/// Alternate recording of the same content (pitch / intonation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    High,
    Low,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::High => "high",
            Variant::Low => "low",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(category, variant, key)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InventoryEntry {
    pub category: Category,
    pub variant: Option<Variant>,
    pub key: String,
}

impl InventoryEntry {
    pub fn new(category: Category, variant: Option<Variant>, key: &str) -> Self {
        Self {
            category,
            variant,
            key: category.normalise_key(key),
        }
    }

    pub fn station(variant: Variant, crs: &str) -> Self {
        Self::new(Category::Station, Some(variant), crs)
    }

    pub fn platform(variant: Variant, platform: &str) -> Self {
        Self::new(Category::Platform, Some(variant), platform)
    }

    /// Parse a dotted clip identifier back into an entry.
    ///
    /// Returns `None` for fixed phrases that sit outside every category
    /// namespace, e.g. `calling at`.
    pub fn from_segment_id(id: &str) -> Option<Self> {
        Category::ALL.into_iter().find_map(|category| {
            let rest = id.strip_prefix(category.namespace())?.strip_prefix('.')?;
            let (variant, rest) = match category {
                Category::Platform | Category::Station => {
                    let (variant, rest) = rest.split_once('.')?;
                    let variant = match variant {
                        "high" => Variant::High,
                        "low" => Variant::Low,
                        _ => return None,
                    };
                    (Some(variant), rest)
                }
                _ => (None, rest),
            };
            let key = match category {
                Category::Platform => rest.strip_prefix("platform ")?,
                Category::Coaches => rest.strip_suffix(" coaches")?,
                Category::DelayTime => rest.strip_suffix(" minutes")?,
                _ => rest,
            };
            (!key.is_empty()).then(|| Self::new(category, variant, key))
        })
    }

    /// Dotted clip identifier for this entry, e.g. `stations.high.CBG`.
    pub fn segment_id(&self) -> String {
        let ns = self.category.namespace();
        let variant = self.variant.map(|v| format!("{v}.")).unwrap_or_default();
        match self.category {
            Category::Platform => format!("{ns}.{variant}platform {}", self.key),
            Category::Coaches => format!("{ns}.{variant}{} coaches", self.key),
            Category::DelayTime => format!("{ns}.{variant}{} minutes", self.key),
            _ => format!("{ns}.{variant}{}", self.key),
        }
    }
}

impl fmt::Display for InventoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment_id())
    }
}

/// Set-backed index of recorded clips, keyed by `(category, variant)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryIndex {
    entries: HashMap<(Category, Option<Variant>), HashSet<String>>,
}

impl InventoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bulk insert.
    pub fn with_keys<I, S>(mut self, category: Category, variant: Option<Variant>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.insert(category, variant, key.as_ref());
        }
        self
    }

    pub fn insert(&mut self, category: Category, variant: Option<Variant>, key: &str) {
        self.entries
            .entry((category, variant))
            .or_default()
            .insert(category.normalise_key(key));
    }

    pub fn exists(&self, category: Category, variant: Option<Variant>, key: &str) -> bool {
        self.entries
            .get(&(category, variant))
            .is_some_and(|keys| keys.contains(&category.normalise_key(key)))
    }

    pub fn contains(&self, entry: &InventoryEntry) -> bool {
        self.exists(entry.category, entry.variant, &entry.key)
    }

    /// Sorted keys recorded for one `(category, variant)` pair.
    pub fn keys(&self, category: Category, variant: Option<Variant>) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .entries
            .get(&(category, variant))
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    /// Total number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
