//! ATOS station announcer, "Anne" voice pack.

use super::{AnnouncementButton, AnnouncementSystem, Preset, SystemId, SystemKind};
use crate::inventory::{Category, InventoryIndex, Variant};
use crate::request::{
    AnnouncementRequest, DisruptedTrainRequest, DisruptionType, NextTrainRequest,
    ThroughTrainRequest,
};
use crate::rules::{AnnouncementPlan, RuleSet, clip, platform, station};
use crate::segments::{PluraliseOptions, SegmentRef, pluralise};
use crate::validate::CheckGroup;

pub const NAME: &str = "ATOS - Anne";
pub const CODE: &str = "ATOS_ANNE_V1";
pub const FILE_PREFIX: &str = "station/atos/anne";

const HOURS: &[&str] = &["07", "12", "13", "15"];
const MINUTES: &[&str] = &["11", "12", "16", "28", "29", "44", "53", "54"];
const TOCS: &[&str] = &["Southern", "Thameslink", "Arriva Trains Wales"];
const DELAY_TIMES: &[&str] = &["17"];
const NUMBERS: &[&str] = &["2", "10", "12"];
/// Low platforms are only recorded for the "stand clear" phrase.
const PLATFORMS_LOW: &[&str] = &["3", "6"];
const PLATFORMS_HIGH: &[&str] = &["1", "3"];
const COACHES: &[&str] = &["8", "10", "12"];
const STATIONS_LOW: &[&str] = &["BDM", "CAT", "CBG", "STP", "VIC"];
const STATIONS_HIGH: &[&str] = &[
    "BAB", "BDK", "BDM", "BFR", "CAT", "CBG", "CLJ", "CTK", "ECR", "FLT", "FPK", "GTW", "HHE",
    "HIT", "HLN", "HPD", "HRH", "KLY", "LBG", "LEA", "LET", "LTN", "LUT", "PUR", "RYS", "SAC",
    "SBS", "STP", "SVG", "TBD", "VIC", "WHP", "WHS", "WHY", "ZFD",
];
const DISRUPTION_REASONS: &[&str] = &["a fault with the signalling system"];

/// Pre-delays at fixed transition points.
const TOC_DELAY_MS: u32 = 75;
const REASON_DELAY_MS: u32 = 250;
const STAND_CLEAR_DELAY_MS: u32 = 400;
const PASSENGERS_FOR_DELAY_MS: u32 = 400;
const CALLING_AT_DELAY_MS: u32 = 750;

pub fn inventory() -> InventoryIndex {
    InventoryIndex::new()
        .with_keys(Category::Hour, None, HOURS)
        .with_keys(Category::Minute, None, MINUTES)
        .with_keys(Category::Toc, None, TOCS)
        .with_keys(Category::DelayTime, None, DELAY_TIMES)
        .with_keys(Category::Number, None, NUMBERS)
        .with_keys(Category::Platform, Some(Variant::Low), PLATFORMS_LOW)
        .with_keys(Category::Platform, Some(Variant::High), PLATFORMS_HIGH)
        .with_keys(Category::Coaches, None, COACHES)
        .with_keys(Category::Station, Some(Variant::Low), STATIONS_LOW)
        .with_keys(Category::Station, Some(Variant::High), STATIONS_HIGH)
        .with_keys(Category::DisruptionReason, None, DISRUPTION_REASONS)
}

pub fn rules() -> RuleSet {
    RuleSet {
        next_train: Some(next_train),
        through_train: Some(through_train),
        disrupted_train: Some(disrupted_train),
    }
}

pub fn system() -> AnnouncementSystem {
    AnnouncementSystem {
        id: SystemId::AtosAnne,
        name: NAME,
        code: CODE,
        kind: SystemKind::Station,
        file_prefix: FILE_PREFIX,
        inventory: inventory(),
        rules: rules(),
        presets: presets(),
        buttons: vec![AnnouncementButton {
            label: "BTP 61016",
            segments: vec![SegmentRef::new("61016")],
        }],
    }
}

fn presets() -> Vec<Preset> {
    let brighton_to_cambridge = NextTrainRequest {
        platform: "1".to_string(),
        hour: "07".to_string(),
        minute: "11".to_string(),
        toc: "thameslink".to_string(),
        terminating_station_code: "CBG".to_string(),
        via: None,
        calling_at: [
            "HHE", "BAB", "TBD", "GTW", "ECR", "LBG", "BFR", "CTK", "ZFD", "STP", "FPK", "SVG",
            "HIT", "LET", "BDK", "RYS",
        ]
        .iter()
        .map(|crs| crs.to_string())
        .collect(),
        coaches: "8".to_string(),
    };

    vec![Preset {
        name: "07:11 | Brighton to Cambridge",
        request: AnnouncementRequest::NextTrain(brighton_to_cambridge),
    }]
}

/// Where the destination sits in the pitch scheme of the train-info phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    /// Falling pitch on the destination unless a via clause follows it.
    Final,
    /// Destination and via both in the high pitch, as used mid-sentence.
    AllHigh,
}

/// "HH MM <operator> service to <destination> [via <station>]"
fn train_info(
    plan: &mut AnnouncementPlan,
    hour: &str,
    minute: &str,
    toc: &str,
    terminating: &str,
    via: Option<&str>,
    destination: Destination,
) {
    plan.say(clip(Category::Hour, hour));
    plan.say(clip(Category::Minute, minute));
    plan.say(clip(Category::Toc, toc).with_delay(TOC_DELAY_MS));
    plan.say("service to");

    match (destination, via) {
        (Destination::AllHigh, Some(via)) => {
            plan.check(CheckGroup::new().stations_high([terminating, via]));
            plan.say(station(Variant::High, terminating));
            plan.say("via");
            plan.say(station(Variant::High, via));
        }
        (Destination::AllHigh, None) => {
            plan.check(CheckGroup::new().stations_high([terminating]));
            plan.say(station(Variant::High, terminating));
        }
        (Destination::Final, Some(via)) => {
            plan.check(
                CheckGroup::new()
                    .stations_high([terminating])
                    .stations_low([via]),
            );
            plan.say(station(Variant::High, terminating));
            plan.say("via");
            plan.say(station(Variant::Low, via));
        }
        (Destination::Final, None) => {
            plan.check(CheckGroup::new().stations_low([terminating]));
            plan.say(station(Variant::Low, terminating));
        }
    }
}

fn next_train(request: &NextTrainRequest) -> AnnouncementPlan {
    let mut plan = AnnouncementPlan::new();

    plan.check(
        CheckGroup::new()
            .platform_high(&request.platform)
            .hour(&request.hour)
            .minute(&request.minute)
            .toc(&request.toc),
    );
    plan.say(platform(Variant::High, &request.platform));
    plan.say("for the");

    train_info(
        &mut plan,
        &request.hour,
        &request.minute,
        &request.toc,
        &request.terminating_station_code,
        request.via.as_deref(),
        Destination::Final,
    );

    plan.say(SegmentRef::new("calling at").with_delay(CALLING_AT_DELAY_MS));

    let terminating = request.terminating_station_code.as_str();
    if request.calling_at.is_empty() {
        plan.check(CheckGroup::new().stations_high([terminating]));
        plan.say(station(Variant::High, terminating));
    } else {
        // The list closes on the destination in the low pitch.
        plan.check(
            CheckGroup::new()
                .stations_low([terminating])
                .stations_high(&request.calling_at),
        );
        let mut stops: Vec<SegmentRef> = request
            .calling_at
            .iter()
            .map(|crs| station(Variant::High, crs))
            .collect();
        stops.push(station(Variant::Low, terminating));
        plan.say_all(pluralise(stops, 0, &PluraliseOptions::default()));
    }

    // Coach counts share their recordings with platform numbers.
    plan.check(CheckGroup::new().coaches(&request.coaches));
    plan.say("this train is formed of");
    plan.say(clip(Category::Coaches, &request.coaches));

    plan
}

fn through_train(request: &ThroughTrainRequest) -> AnnouncementPlan {
    let mut plan = AnnouncementPlan::new();

    plan.check(
        CheckGroup::new()
            .platform_high(&request.platform)
            .platform_low(&request.platform),
    );
    plan.say("the train now approaching");
    plan.say(platform(Variant::High, &request.platform));
    plan.say("does not stop here");
    plan.say(
        SegmentRef::new("please stand well clear of the edge of").with_delay(STAND_CLEAR_DELAY_MS),
    );
    plan.say(platform(Variant::Low, &request.platform));

    plan
}

fn disrupted_train(request: &DisruptedTrainRequest) -> AnnouncementPlan {
    let mut plan = AnnouncementPlan::new();
    let delay_time = request.delay_time.as_deref();
    let reason = request.disruption_reason.as_deref();
    let cancelled = request.disruption_type == DisruptionType::Cancelled;

    plan.check(
        CheckGroup::new()
            .hour(&request.hour)
            .minute(&request.minute)
            .toc(&request.toc)
            .delay_time(delay_time)
            .disruption_reason(reason),
    );

    if cancelled {
        plan.check(CheckGroup::new().platform_low(&request.platform));
        plan.say("may i have your attention please on");
        plan.say(platform(Variant::Low, &request.platform));
        plan.say("we are sorry to announce that the");
    } else {
        plan.say("we are sorry that the");
    }

    train_info(
        &mut plan,
        &request.hour,
        &request.minute,
        &request.toc,
        &request.terminating_station_code,
        request.via.as_deref(),
        Destination::AllHigh,
    );

    match (request.disruption_type, delay_time) {
        (DisruptionType::Delayed, None) => plan.say("is delayed"),
        (DisruptionType::Delayed, Some(minutes)) => {
            plan.say("is delayed by approximately");
            plan.say(clip(Category::DelayTime, minutes));
        }
        (DisruptionType::Cancelled, _) => plan.say("has been cancelled"),
    }

    if let Some(reason) = reason {
        plan.say(SegmentRef::new("this is due to").with_delay(REASON_DELAY_MS));
        plan.say(clip(Category::DisruptionReason, reason));
    }

    if !cancelled && delay_time.is_none() {
        plan.say("please listen for further announcements");
    }

    // Alternatives are only known once the delay is known, or the train is gone.
    if delay_time.is_some() || cancelled {
        for alternative in &request.alternative_services {
            plan.check(
                CheckGroup::new()
                    .platform_low(&alternative.platform)
                    .hour(&alternative.hour)
                    .minute(&alternative.minute)
                    .stations_high(&alternative.passengers_for),
            );

            plan.say(SegmentRef::new("passengers for").with_delay(PASSENGERS_FOR_DELAY_MS));
            let stops = alternative
                .passengers_for
                .iter()
                .map(|crs| station(Variant::High, crs))
                .collect();
            plan.say_all(pluralise(stops, 0, &PluraliseOptions::default()));
            plan.say("your next fastest direct service is now expected to be the");
            plan.say(clip(Category::Hour, &alternative.hour));
            plan.say(clip(Category::Minute, &alternative.minute));
            plan.say("to");

            let terminating = alternative.terminating_crs.as_str();
            match alternative.via.as_deref() {
                Some(via) => {
                    plan.check(
                        CheckGroup::new()
                            .stations_high([terminating])
                            .stations_low([via]),
                    );
                    plan.say(station(Variant::High, terminating));
                    plan.say("via");
                    plan.say(station(Variant::Low, via));
                }
                None => {
                    plan.check(CheckGroup::new().stations_low([terminating]));
                    plan.say(station(Variant::Low, terminating));
                }
            }

            plan.say("departing from");
            plan.say(platform(Variant::Low, &alternative.platform));
        }
    }

    plan
}
