//! CRS code to station name lookup.
//!
//! Only used to word user-facing messages; control flow never depends on it.

use crate::inventory::{Category, InventoryEntry};

const STATIONS: &[(&str, &str)] = &[
    ("BAB", "Balcombe"),
    ("BDK", "Baldock"),
    ("BDM", "Bedford"),
    ("BFR", "London Blackfriars"),
    ("CAT", "Caterham"),
    ("CBG", "Cambridge"),
    ("CLJ", "Clapham Junction"),
    ("CTK", "City Thameslink"),
    ("ECR", "East Croydon"),
    ("FLT", "Flitwick"),
    ("FPK", "Finsbury Park"),
    ("GTW", "Gatwick Airport"),
    ("HHE", "Haywards Heath"),
    ("HIT", "Hitchin"),
    ("HLN", "Harlington"),
    ("HPD", "Harpenden"),
    ("HRH", "Horsham"),
    ("KLY", "Kenley"),
    ("LBG", "London Bridge"),
    ("LEA", "Leagrave"),
    ("LET", "Letchworth Garden City"),
    ("LTN", "Luton Airport Parkway"),
    ("LUT", "Luton"),
    ("PUR", "Purley"),
    ("RYS", "Royston"),
    ("SAC", "St Albans City"),
    ("STP", "London St Pancras International"),
    ("SVG", "Stevenage"),
    ("TBD", "Three Bridges"),
    ("VIC", "London Victoria"),
    ("WHP", "West Hampstead Thameslink"),
    ("WHS", "Whyteleafe South"),
    ("WHY", "Whyteleafe"),
    ("ZFD", "Farringdon"),
];

/// Human-readable name for a CRS code.
pub fn station_name(crs: &str) -> Option<&'static str> {
    STATIONS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(crs))
        .map(|(_, name)| *name)
}

/// Message shown to a user whose request needs an unrecorded clip.
pub fn describe_missing(entry: &InventoryEntry) -> String {
    let variant = entry
        .variant
        .map(|v| format!(" (type: {v})"))
        .unwrap_or_default();

    match entry.category {
        Category::Station => {
            let name = station_name(&entry.key).unwrap_or(entry.key.as_str());
            format!(
                "No recording of {name} ({}) in the pitch this announcement needs{variant}",
                entry.key
            )
        }
        _ => format!("No recording for {entry}{variant}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Variant;

    #[test]
    fn known_station_name() {
        assert_eq!(station_name("CBG"), Some("Cambridge"));
        assert_eq!(station_name("zfd"), Some("Farringdon"));
    }

    #[test]
    fn unknown_station_name() {
        assert_eq!(station_name("XYZ"), None);
    }

    #[test]
    fn describe_missing_station_uses_name() {
        let message = describe_missing(&InventoryEntry::station(Variant::High, "CBG"));
        assert_eq!(
            message,
            "No recording of Cambridge (CBG) in the pitch this announcement needs (type: high)"
        );
    }

    #[test]
    fn describe_missing_unknown_station_falls_back_to_code() {
        let message = describe_missing(&InventoryEntry::station(Variant::Low, "XYZ"));
        assert!(message.starts_with("No recording of XYZ (XYZ)"));
    }

    #[test]
    fn describe_missing_other_category() {
        let message = describe_missing(&InventoryEntry::new(Category::Hour, None, "23"));
        assert_eq!(message, "No recording for times.hour.23");
    }
}
