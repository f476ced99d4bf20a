//! JSON codecs for the three persisted blobs.
//!
//! Decoding never fails. A blob that is missing or is not JSON yields
//! defaults; a field with the wrong type or an out-of-range value is dropped
//! on its own and replaced by a safe default, with a warning in the log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::stats::{DailyStat, Ledger};
use crate::timer::settings::{
    default_long_break_minutes, default_pomodoros_per_long_break, default_short_break_minutes,
    default_work_minutes,
};
use crate::timer::{Settings, Stage, TimerState};

/// Timer snapshot as written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTimerState {
    pub stage: Stage,
    pub seconds_remaining: u64,
    pub pomodoros_completed_today: u32,
    pub pomodoros_completed_in_cycle: u32,
    /// Date `pomodoros_completed_today` refers to.
    pub persisted_date: NaiveDate,
    /// Set when the snapshot was taken while the timer was running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,
}

/// A decoded snapshot, already checked against the current settings and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredTimer {
    /// Always stopped; a pending suspension is reported separately.
    pub state: TimerState,
    pub counted_on: NaiveDate,
    pub suspended_at: Option<DateTime<Utc>>,
}

fn parse_object(raw: Option<&str>, what: &str) -> Option<Map<String, Value>> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(blob = what, "persisted blob is not an object, using defaults");
            None
        }
        Err(e) => {
            warn!(blob = what, error = %e, "persisted blob is not valid JSON, using defaults");
            None
        }
    }
}

fn non_negative_int(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.floor() as u64)
    })
}

fn field_u32(map: &Map<String, Value>, key: &str) -> Option<u32> {
    map.get(key)
        .and_then(non_negative_int)
        .and_then(|n| u32::try_from(n).ok())
}

pub fn encode_settings(settings: &Settings) -> Result<String, serde_json::Error> {
    serde_json::to_string(settings)
}

pub fn decode_settings(raw: Option<&str>) -> Settings {
    let Some(map) = parse_object(raw, "settings") else {
        return Settings::default();
    };

    let minutes = |key: &str, default: fn() -> u32| match field_u32(&map, key) {
        Some(m) if m > 0 => m,
        Some(_) | None => {
            if map.contains_key(key) {
                warn!(field = key, "discarding invalid stage length");
            }
            default()
        }
    };

    Settings {
        work_minutes: minutes("work_minutes", default_work_minutes),
        short_break_minutes: minutes("short_break_minutes", default_short_break_minutes),
        long_break_minutes: minutes("long_break_minutes", default_long_break_minutes),
        pomodoros_per_long_break: match field_u32(&map, "pomodoros_per_long_break") {
            Some(n) => n,
            None => {
                if map.contains_key("pomodoros_per_long_break") {
                    warn!("discarding invalid pomodoros_per_long_break");
                }
                default_pomodoros_per_long_break()
            }
        },
    }
}

pub fn encode_timer_state(snapshot: &PersistedTimerState) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Decode a timer snapshot against `settings` on `today`.
///
/// - unknown stage: WORK at full length
/// - bad or missing `seconds_remaining`: full stage length; otherwise clamped
///   to the stage length
/// - snapshot from another day (or undated): today's count starts at 0
/// - cycle count clamped to what `settings` allows
pub fn decode_timer_state(raw: Option<&str>, settings: &Settings, today: NaiveDate) -> RestoredTimer {
    let fresh = RestoredTimer {
        state: TimerState::new(settings),
        counted_on: today,
        suspended_at: None,
    };
    let Some(map) = parse_object(raw, "timer_state") else {
        return fresh;
    };

    let stage = map
        .get("stage")
        .and_then(|v| serde_json::from_value::<Stage>(v.clone()).ok());

    let (stage, seconds_remaining) = match stage {
        Some(stage) => {
            let full = settings.duration_secs(stage);
            let remaining = match map.get("seconds_remaining").and_then(non_negative_int) {
                Some(secs) if secs > 0 => secs.min(full),
                Some(_) => {
                    warn!("persisted stage had no time left, reloading full length");
                    full
                }
                None => {
                    warn!("discarding invalid seconds_remaining");
                    full
                }
            };
            (stage, remaining)
        }
        None => {
            warn!("unknown stage in persisted timer state, starting at WORK");
            (Stage::Work, settings.duration_secs(Stage::Work))
        }
    };

    let persisted_date = map
        .get("persisted_date")
        .and_then(|v| serde_json::from_value::<NaiveDate>(v.clone()).ok());
    let pomodoros_completed_today = if persisted_date == Some(today) {
        field_u32(&map, "pomodoros_completed_today").unwrap_or(0)
    } else {
        0
    };

    let pomodoros_completed_in_cycle = field_u32(&map, "pomodoros_completed_in_cycle")
        .unwrap_or(0)
        .min(settings.max_cycle_count());

    let suspended_at = match map.get("suspended_at") {
        None | Some(Value::Null) => None,
        Some(v) => match serde_json::from_value::<DateTime<Utc>>(v.clone()) {
            Ok(at) => Some(at),
            Err(_) => {
                warn!("discarding invalid suspended_at");
                None
            }
        },
    };

    RestoredTimer {
        state: TimerState {
            stage,
            seconds_remaining,
            is_running: false,
            pomodoros_completed_today,
            pomodoros_completed_in_cycle,
        },
        counted_on: today,
        suspended_at,
    }
}

pub fn encode_ledger(ledger: &Ledger) -> Result<String, serde_json::Error> {
    serde_json::to_string(ledger)
}

/// Decode the ledger, dropping entries whose date or numbers do not parse.
pub fn decode_ledger(raw: Option<&str>) -> Ledger {
    let mut ledger = Ledger::new();
    let Some(map) = parse_object(raw, "daily_stats") else {
        return ledger;
    };

    for (key, value) in &map {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
            warn!(key = %key, "dropping ledger entry with unparseable date");
            continue;
        };
        let stat = value.as_object().and_then(|entry| {
            Some(DailyStat {
                count: field_u32(entry, "count")?,
                total_work_minutes: entry.get("total_work_minutes").and_then(non_negative_int)?,
            })
        });
        match stat {
            Some(stat) => ledger.insert_loaded(date, stat),
            None => warn!(date = %date, "dropping malformed ledger entry"),
        }
    }
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn settings_missing_blob_is_default() {
        assert_eq!(decode_settings(None), Settings::default());
        assert_eq!(decode_settings(Some("not json")), Settings::default());
        assert_eq!(decode_settings(Some("[1,2]")), Settings::default());
    }

    #[test]
    fn settings_bad_fields_fall_back_individually() {
        let s = decode_settings(Some(
            r#"{"work_minutes": 50, "short_break_minutes": "five", "long_break_minutes": 0, "pomodoros_per_long_break": 0}"#,
        ));
        assert_eq!(s.work_minutes, 50);
        assert_eq!(s.short_break_minutes, 5);
        assert_eq!(s.long_break_minutes, 15);
        assert_eq!(s.pomodoros_per_long_break, 0);
    }

    #[test]
    fn settings_roundtrip() {
        let s = Settings {
            work_minutes: 45,
            short_break_minutes: 10,
            long_break_minutes: 20,
            pomodoros_per_long_break: 3,
        };
        assert_eq!(decode_settings(Some(&encode_settings(&s).unwrap())), s);
    }

    #[test]
    fn timer_state_roundtrip_same_day() {
        let settings = Settings::default();
        let snapshot = PersistedTimerState {
            stage: Stage::ShortBreak,
            seconds_remaining: 120,
            pomodoros_completed_today: 3,
            pomodoros_completed_in_cycle: 3,
            persisted_date: today(),
            suspended_at: None,
        };
        let raw = encode_timer_state(&snapshot).unwrap();
        let restored = decode_timer_state(Some(&raw), &settings, today());
        assert_eq!(restored.state.stage, Stage::ShortBreak);
        assert_eq!(restored.state.seconds_remaining, 120);
        assert_eq!(restored.state.pomodoros_completed_today, 3);
        assert_eq!(restored.state.pomodoros_completed_in_cycle, 3);
        assert!(!restored.state.is_running);
        assert!(restored.suspended_at.is_none());
    }

    #[test]
    fn unknown_stage_restarts_at_full_work() {
        let restored = decode_timer_state(
            Some(r#"{"stage": "NAP", "seconds_remaining": 10}"#),
            &Settings::default(),
            today(),
        );
        assert_eq!(restored.state.stage, Stage::Work);
        assert_eq!(restored.state.seconds_remaining, 1500);
    }

    #[test]
    fn negative_or_non_numeric_time_left_means_full_stage() {
        for bad in [r#"-5"#, r#""soon""#, "null"] {
            let raw = format!(r#"{{"stage": "LONG_BREAK", "seconds_remaining": {bad}}}"#);
            let restored = decode_timer_state(Some(&raw), &Settings::default(), today());
            assert_eq!(restored.state.stage, Stage::LongBreak);
            assert_eq!(restored.state.seconds_remaining, 900, "input {bad}");
        }
    }

    #[test]
    fn zero_time_left_reloads_full_stage() {
        let restored = decode_timer_state(
            Some(r#"{"stage": "WORK", "seconds_remaining": 0, "pomodoros_completed_in_cycle": 1}"#),
            &Settings::default(),
            today(),
        );
        assert_eq!(restored.state.stage, Stage::Work);
        assert_eq!(restored.state.seconds_remaining, 1500);
        assert_eq!(restored.state.pomodoros_completed_in_cycle, 1);
    }

    #[test]
    fn time_left_is_clamped_to_stage_length() {
        let restored = decode_timer_state(
            Some(r#"{"stage": "SHORT_BREAK", "seconds_remaining": 99999}"#),
            &Settings::default(),
            today(),
        );
        assert_eq!(restored.state.seconds_remaining, 300);
    }

    #[test]
    fn count_from_previous_day_is_dropped() {
        let restored = decode_timer_state(
            Some(
                r#"{"stage": "WORK", "seconds_remaining": 60, "pomodoros_completed_today": 7, "persisted_date": "2024-05-31"}"#,
            ),
            &Settings::default(),
            today(),
        );
        assert_eq!(restored.state.pomodoros_completed_today, 0);
        assert_eq!(restored.state.seconds_remaining, 60);
        assert_eq!(restored.counted_on, today());
    }

    #[test]
    fn cycle_count_is_clamped_to_settings() {
        let settings = Settings {
            pomodoros_per_long_break: 2,
            ..Settings::default()
        };
        let restored = decode_timer_state(
            Some(r#"{"stage": "WORK", "seconds_remaining": 60, "pomodoros_completed_in_cycle": 9}"#),
            &settings,
            today(),
        );
        assert_eq!(restored.state.pomodoros_completed_in_cycle, 1);

        let disabled = Settings {
            pomodoros_per_long_break: 0,
            ..Settings::default()
        };
        let restored = decode_timer_state(
            Some(r#"{"stage": "WORK", "seconds_remaining": 60, "pomodoros_completed_in_cycle": 9}"#),
            &disabled,
            today(),
        );
        assert_eq!(restored.state.pomodoros_completed_in_cycle, 0);
    }

    #[test]
    fn suspended_at_survives_roundtrip() {
        let at = "2024-06-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let snapshot = PersistedTimerState {
            stage: Stage::Work,
            seconds_remaining: 100,
            pomodoros_completed_today: 0,
            pomodoros_completed_in_cycle: 0,
            persisted_date: today(),
            suspended_at: Some(at),
        };
        let raw = encode_timer_state(&snapshot).unwrap();
        let restored = decode_timer_state(Some(&raw), &Settings::default(), today());
        assert_eq!(restored.suspended_at, Some(at));
        assert!(!restored.state.is_running);
    }

    #[test]
    fn ledger_drops_only_bad_entries() {
        let ledger = decode_ledger(Some(
            r#"{
                "2024-06-01": {"count": 2, "total_work_minutes": 50},
                "yesterday": {"count": 1, "total_work_minutes": 25},
                "2024-05-31": {"count": -1, "total_work_minutes": 25},
                "2024-05-30": "lots"
            }"#,
        ));
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.get(today()),
            Some(&DailyStat { count: 2, total_work_minutes: 50 })
        );
    }

    #[test]
    fn ledger_roundtrip() {
        let mut ledger = Ledger::new();
        ledger.record_completion(today(), 25);
        ledger.record_completion(today(), 25);
        let raw = encode_ledger(&ledger).unwrap();
        assert_eq!(decode_ledger(Some(&raw)), ledger);
    }
}
