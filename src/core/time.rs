//! Timestamp and identifier helpers.

use chrono::{DateTime, Utc};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// UTC `YYYYMMDDHHmmss`. Whole-second granularity.
pub fn compact_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

pub fn now_compact_utc() -> String {
    compact_utc(Utc::now())
}

pub fn new_uuid() -> String {
    Uuid::now_v7().to_string()
}

pub fn generate_uuids(count: usize) -> Vec<String> {
    (0..count).map(|_| new_uuid()).collect()
}

/// Timestamp ids, one second apart so each is distinct.
pub fn generate_tsids(count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(now_compact_utc());
        if i + 1 < count {
            thread::sleep(Duration::from_secs(1));
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn compact_utc_format() {
        let at = Utc.with_ymd_and_hms(2025, 12, 14, 0, 49, 18).single().expect("valid date");
        assert_eq!(compact_utc(at), "20251214004918");
    }

    #[test]
    fn now_compact_is_fourteen_digits() {
        let ts = now_compact_utc();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn uuids_are_unique_and_parse() {
        let ids = generate_uuids(3);
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        for id in &ids {
            assert!(Uuid::parse_str(id).is_ok());
        }
    }

    #[test]
    fn single_tsid_does_not_sleep() {
        assert_eq!(generate_tsids(1).len(), 1);
        assert!(generate_tsids(0).is_empty());
    }
}
