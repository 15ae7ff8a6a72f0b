//! Expiry policy
//!
//! Pure functions mapping (section, event date, timestamps) to expiry
//! decisions. The sweep itself is a set of guarded UPDATEs in the post
//! model; the timing rules live here so they can be tested without a
//! database.

use chrono::{DateTime, Duration, Utc};

use super::Section;

/// Days before an ALERT goes stale.
pub const ALERT_DAYS: i64 = 7;

/// Days before HAPPENINGS, LOST_FOUND and NEIGHBORS posts go stale.
pub const DEFAULT_DAYS: i64 = 14;

/// Compute the expiry timestamp written at approval time.
///
/// BOARD_NOTES never expire automatically; a moderator may still set an
/// explicit expiry. HAPPENINGS expire at their event date when one is set.
pub fn compute_expiry(
    section: Section,
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match section {
        Section::Alert => Some(now + Duration::days(ALERT_DAYS)),
        Section::Happenings => {
            Some(event_date.unwrap_or_else(|| now + Duration::days(DEFAULT_DAYS)))
        }
        Section::LostFound | Section::Neighbors => Some(now + Duration::days(DEFAULT_DAYS)),
        Section::BoardNotes => None,
    }
}

/// Decide whether a LIVE post is past its useful life.
///
/// Mirrors the guarded sweep UPDATEs so both stay in agreement:
/// - ALERT: created more than 7 days ago
/// - HAPPENINGS: event date passed, or created more than 14 days ago
/// - LOST_FOUND / NEIGHBORS: created more than 14 days ago
/// - BOARD_NOTES: only when an explicit expiresAt has passed
pub fn should_auto_expire(
    section: Section,
    created_at: DateTime<Utc>,
    event_date: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match section {
        Section::Alert => created_at + Duration::days(ALERT_DAYS) < now,
        Section::Happenings => {
            event_date.map(|e| e < now).unwrap_or(false)
                || created_at + Duration::days(DEFAULT_DAYS) < now
        }
        Section::LostFound | Section::Neighbors => created_at + Duration::days(DEFAULT_DAYS) < now,
        Section::BoardNotes => expires_at.map(|e| e < now).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_alert_expires_in_seven_days() {
        let now = ts(2025, 6, 1);
        assert_eq!(
            compute_expiry(Section::Alert, None, now),
            Some(now + Duration::days(7))
        );
    }

    #[test]
    fn test_happenings_uses_event_date_when_set() {
        let now = ts(2025, 6, 1);
        let event = ts(2025, 6, 2);
        assert_eq!(compute_expiry(Section::Happenings, Some(event), now), Some(event));
    }

    #[test]
    fn test_happenings_defaults_to_fourteen_days() {
        let now = ts(2025, 6, 1);
        assert_eq!(
            compute_expiry(Section::Happenings, None, now),
            Some(now + Duration::days(14))
        );
    }

    #[test]
    fn test_lost_found_and_neighbors_fourteen_days() {
        let now = ts(2025, 6, 1);
        for section in [Section::LostFound, Section::Neighbors] {
            assert_eq!(
                compute_expiry(section, None, now),
                Some(now + Duration::days(14))
            );
        }
    }

    #[test]
    fn test_board_notes_never_auto_expire() {
        let now = ts(2025, 6, 1);
        assert_eq!(compute_expiry(Section::BoardNotes, Some(now), now), None);
    }

    #[test]
    fn test_alert_sweeps_after_seven_days() {
        let created = ts(2025, 6, 1);
        assert!(!should_auto_expire(
            Section::Alert,
            created,
            None,
            None,
            ts(2025, 6, 7)
        ));
        assert!(should_auto_expire(
            Section::Alert,
            created,
            None,
            None,
            ts(2025, 6, 9)
        ));
    }

    #[test]
    fn test_happenings_sweeps_after_event_date() {
        let created = ts(2025, 6, 1);
        let event = ts(2025, 6, 3);
        assert!(should_auto_expire(
            Section::Happenings,
            created,
            Some(event),
            None,
            ts(2025, 6, 4)
        ));
        assert!(!should_auto_expire(
            Section::Happenings,
            created,
            Some(event),
            None,
            ts(2025, 6, 2)
        ));
    }

    #[test]
    fn test_happenings_without_event_date_sweeps_after_fourteen_days() {
        let created = ts(2025, 6, 1);
        assert!(should_auto_expire(
            Section::Happenings,
            created,
            None,
            None,
            ts(2025, 6, 16)
        ));
    }

    #[test]
    fn test_board_notes_sweep_only_with_explicit_expiry() {
        let created = ts(2025, 1, 1);
        // Months old but no explicit expiry: stays up.
        assert!(!should_auto_expire(
            Section::BoardNotes,
            created,
            None,
            None,
            ts(2025, 6, 1)
        ));
        assert!(should_auto_expire(
            Section::BoardNotes,
            created,
            None,
            Some(ts(2025, 5, 1)),
            ts(2025, 6, 1)
        ));
    }
}
