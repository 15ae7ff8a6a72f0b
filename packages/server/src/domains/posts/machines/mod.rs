//! Post lifecycle state machine
//!
//! Pure decision logic - NO IO, only state transitions and validation.
//! This module owns:
//!
//! - Section and status vocabularies
//! - Transition guards (which moderation actions are legal from which status)
//! - Edit-history stacking and undo
//! - Coordinate validation for structured locations
//! - Approval field computation (section override, expiry)
//!
//! Expiry timing rules live in the `expiry` submodule.

pub mod expiry;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of prior snapshots retained for undo.
pub const MAX_HISTORY: usize = 10;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum length of a location display name.
pub const MAX_LOCATION_CHARS: usize = 200;

/// Maximum length of a private moderator note.
pub const MAX_NOTE_CHARS: usize = 1000;

// =============================================================================
// Enums for type-safe edges
// =============================================================================

/// Board section enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Section {
    Alert,
    Happenings,
    LostFound,
    Neighbors,
    /// Moderator-authored only. Never settable via public submission.
    BoardNotes,
}

impl Section {
    /// Sections a public submitter may choose.
    pub const PUBLIC: [Section; 4] = [
        Section::Alert,
        Section::Happenings,
        Section::LostFound,
        Section::Neighbors,
    ];

    /// Display order on the public board.
    pub const DISPLAY_ORDER: [Section; 5] = [
        Section::Alert,
        Section::BoardNotes,
        Section::Happenings,
        Section::LostFound,
        Section::Neighbors,
    ];

    pub fn is_public(&self) -> bool {
        Self::PUBLIC.contains(self)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Alert => write!(f, "ALERT"),
            Section::Happenings => write!(f, "HAPPENINGS"),
            Section::LostFound => write!(f, "LOST_FOUND"),
            Section::Neighbors => write!(f, "NEIGHBORS"),
            Section::BoardNotes => write!(f, "BOARD_NOTES"),
        }
    }
}

impl std::str::FromStr for Section {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ALERT" => Ok(Section::Alert),
            "HAPPENINGS" => Ok(Section::Happenings),
            "LOST_FOUND" => Ok(Section::LostFound),
            "NEIGHBORS" => Ok(Section::Neighbors),
            "BOARD_NOTES" => Ok(Section::BoardNotes),
            _ => Err(anyhow::anyhow!("Invalid section: {}", s)),
        }
    }
}

/// Status enum for type-safe edges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Live,
    Rejected,
    Expired,
    Deleted,
}

impl Status {
    /// REJECTED, EXPIRED and DELETED collectively form the archive. From the
    /// archive the only further actions are restore and purge.
    pub fn is_archive(&self) -> bool {
        matches!(self, Status::Rejected | Status::Expired | Status::Deleted)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "PENDING"),
            Status::Live => write!(f, "LIVE"),
            Status::Rejected => write!(f, "REJECTED"),
            Status::Expired => write!(f, "EXPIRED"),
            Status::Deleted => write!(f, "DELETED"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Status::Pending),
            "LIVE" => Ok(Status::Live),
            "REJECTED" => Ok(Status::Rejected),
            "EXPIRED" => Ok(Status::Expired),
            "DELETED" => Ok(Status::Deleted),
            _ => Err(anyhow::anyhow!("Invalid status: {}", s)),
        }
    }
}

// =============================================================================
// Transition guards
// =============================================================================

/// Approve is only legal from PENDING. Re-approval requires a restore first.
pub fn can_approve(status: Status) -> bool {
    status == Status::Pending
}

/// Reject is only legal from PENDING.
pub fn can_reject(status: Status) -> bool {
    status == Status::Pending
}

/// Edits (and rewrites) are legal while the post is still in play.
pub fn can_edit(status: Status) -> bool {
    matches!(status, Status::Pending | Status::Live)
}

/// Forced expiry only applies to LIVE posts.
pub fn can_expire_now(status: Status) -> bool {
    status == Status::Live
}

/// Restore brings an archived post back to the PENDING queue.
pub fn can_restore(status: Status) -> bool {
    status.is_archive()
}

/// Purge permanently removes an archived post.
pub fn can_purge(status: Status) -> bool {
    status.is_archive()
}

// =============================================================================
// Edit history
// =============================================================================

/// A prior content snapshot, pushed before every mutating edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub title: String,
    pub desc: String,
    pub timestamp: DateTime<Utc>,
}

/// Push a snapshot, dropping the oldest entry when the stack is full.
pub fn push_history(history: &mut Vec<HistorySnapshot>, snapshot: HistorySnapshot) {
    history.push(snapshot);
    while history.len() > MAX_HISTORY {
        history.remove(0);
    }
}

/// Pop the most recent snapshot. `None` when there is nothing to undo.
pub fn pop_history(history: &mut Vec<HistorySnapshot>) -> Option<HistorySnapshot> {
    history.pop()
}

// =============================================================================
// Validation
// =============================================================================

/// A validated structured location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Validate a coordinate pair: both present and in range, or both absent.
///
/// Partial coordinates are an error, not a silent drop.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinates>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(anyhow::anyhow!("Coordinates out of range"));
            }
            Ok(Some(Coordinates {
                latitude: lat,
                longitude: lon,
            }))
        }
        _ => Err(anyhow::anyhow!(
            "Latitude and longitude must both be present or both absent"
        )),
    }
}

/// Validate a plain-text title.
pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(anyhow::anyhow!(
            "Title exceeds {} characters",
            MAX_TITLE_CHARS
        ));
    }
    Ok(())
}

// =============================================================================
// Approval
// =============================================================================

/// Fields computed when a PENDING post goes LIVE.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalFields {
    pub section: Section,
    pub approved_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Compute the fields an approval writes. Expiry is fixed here and never
/// recomputed by later edits.
pub fn approval_fields(
    current_section: Section,
    section_override: Option<Section>,
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ApprovalFields {
    let section = section_override.unwrap_or(current_section);
    ApprovalFields {
        section,
        approved_at: now,
        expires_at: expiry::compute_expiry(section, event_date, now),
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
    fn test_section_roundtrip() {
        for section in Section::DISPLAY_ORDER {
            let parsed: Section = section.to_string().parse().unwrap();
            assert_eq!(parsed, section);
        }
    }

    #[test]
    fn test_board_notes_is_not_public() {
        assert!(!Section::BoardNotes.is_public());
        assert!(Section::Alert.is_public());
        assert!(!Section::PUBLIC.contains(&Section::BoardNotes));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            Status::Pending,
            Status::Live,
            Status::Rejected,
            Status::Expired,
            Status::Deleted,
        ] {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_approve_only_from_pending() {
        assert!(can_approve(Status::Pending));
        assert!(!can_approve(Status::Live));
        assert!(!can_approve(Status::Rejected));
        assert!(!can_approve(Status::Expired));
        assert!(!can_approve(Status::Deleted));
    }

    #[test]
    fn test_edit_from_pending_or_live_only() {
        assert!(can_edit(Status::Pending));
        assert!(can_edit(Status::Live));
        assert!(!can_edit(Status::Rejected));
        assert!(!can_edit(Status::Expired));
        assert!(!can_edit(Status::Deleted));
    }

    #[test]
    fn test_archive_membership() {
        assert!(Status::Rejected.is_archive());
        assert!(Status::Expired.is_archive());
        assert!(Status::Deleted.is_archive());
        assert!(!Status::Pending.is_archive());
        assert!(!Status::Live.is_archive());
    }

    #[test]
    fn test_restore_and_purge_from_archive_only() {
        assert!(can_restore(Status::Deleted));
        assert!(can_purge(Status::Expired));
        assert!(!can_restore(Status::Live));
        assert!(!can_purge(Status::Pending));
    }

    #[test]
    fn test_history_caps_at_max_dropping_oldest() {
        let mut history = Vec::new();
        for i in 0..11 {
            push_history(
                &mut history,
                HistorySnapshot {
                    title: format!("title {}", i),
                    desc: format!("desc {}", i),
                    timestamp: ts(2025, 1, 1),
                },
            );
        }
        assert_eq!(history.len(), MAX_HISTORY);
        // Entry 0 fell off; entry 1 is now the oldest.
        assert_eq!(history[0].title, "title 1");
        assert_eq!(history[9].title, "title 10");
    }

    #[test]
    fn test_undo_pops_most_recent() {
        let mut history = Vec::new();
        for i in 0..11 {
            push_history(
                &mut history,
                HistorySnapshot {
                    title: format!("title {}", i),
                    desc: format!("desc {}", i),
                    timestamp: ts(2025, 1, 1),
                },
            );
        }
        let popped = pop_history(&mut history).unwrap();
        assert_eq!(popped.title, "title 10");
        assert_eq!(history.len(), 9);
    }

    #[test]
    fn test_undo_empty_history_is_none() {
        let mut history: Vec<HistorySnapshot> = Vec::new();
        assert!(pop_history(&mut history).is_none());
    }

    #[test]
    fn test_coordinates_both_or_neither() {
        assert_eq!(validate_coordinates(None, None).unwrap(), None);
        assert!(validate_coordinates(Some(45.0), None).is_err());
        assert!(validate_coordinates(None, Some(-93.0)).is_err());

        let coords = validate_coordinates(Some(45.0), Some(-93.2)).unwrap().unwrap();
        assert_eq!(coords.latitude, 45.0);
        assert_eq!(coords.longitude, -93.2);
    }

    #[test]
    fn test_coordinates_range() {
        assert!(validate_coordinates(Some(91.0), Some(0.0)).is_err());
        assert!(validate_coordinates(Some(0.0), Some(181.0)).is_err());
        assert!(validate_coordinates(Some(-90.0), Some(-180.0)).is_ok());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Lost cat near the park").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"a".repeat(101)).is_err());
        assert!(validate_title(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn test_approval_fields_uses_override() {
        let now = ts(2025, 6, 1);
        let fields = approval_fields(Section::Neighbors, Some(Section::Alert), None, now);
        assert_eq!(fields.section, Section::Alert);
        assert_eq!(fields.approved_at, now);
        assert_eq!(fields.expires_at, Some(now + chrono::Duration::days(7)));
    }

    #[test]
    fn test_approval_fields_without_override() {
        let now = ts(2025, 6, 1);
        let fields = approval_fields(Section::LostFound, None, None, now);
        assert_eq!(fields.section, Section::LostFound);
        assert_eq!(fields.expires_at, Some(now + chrono::Duration::days(14)));
    }
}
