//! Public submission action.
//!
//! Sanitize and validate, create the post, then fire analysis in the
//! background. The HTTP response never reveals whether the submitter was
//! blocked or whether analysis ran.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::common::utils::richtext::sanitize_rich_text;
use crate::common::utils::text::{sanitize_inline, truncate_chars};
use crate::common::{PostId, SubmitterId};
use crate::domains::posts::actions::{ActionError, ActionResult};
use crate::domains::posts::ai_assist;
use crate::domains::posts::machines::{self, Section, Status, MAX_LOCATION_CHARS};
use crate::domains::posts::models::{BlockAction, CreatePost, Post, Submitter};
use crate::kernel::ServerDeps;

/// Description size cap in bytes, after sanitization.
pub const MAX_DESC_BYTES: usize = 20_000;

/// Raw submission form fields.
#[derive(Debug, Clone)]
pub struct SubmitInput {
    pub title: String,
    pub description: String,
    pub section: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    /// Honeypot field. Real visitors leave it empty.
    pub website: Option<String>,
    /// Submitter id from the visitor's cookie, if any.
    pub submitter_id: Option<SubmitterId>,
}

/// What the submission produced. The HTTP layer reports success for every
/// variant; the distinction only matters internally.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Post created (PENDING, or REJECTED for blocked-and-reject submitters).
    Accepted {
        post_id: PostId,
        submitter_id: SubmitterId,
    },
    /// Honeypot tripped. Nothing was stored.
    SilentlyDropped,
}

/// Validated, sanitized submission content.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub title: String,
    pub description: String,
    pub section: Section,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
}

/// Bots fill every field; humans never see the honeypot.
fn honeypot_tripped(website: Option<&str>) -> bool {
    website.is_some_and(|w| !w.trim().is_empty())
}

/// Route a submission by its submitter's standing: the status the post is
/// created with, and an auto-flag note when the queue should be warned.
/// Blocked submitters are never silently accepted: their posts either land
/// straight in REJECTED or enter the queue flagged.
fn route_submission(submitter: &Submitter) -> (Status, Option<String>) {
    if !submitter.blocked {
        return (Status::Pending, None);
    }
    match submitter.block_action() {
        Some(BlockAction::Flag) => {
            let note = format!(
                "Auto-flagged: submitter is blocked ({})",
                submitter.block_reason.as_deref().unwrap_or("no reason recorded")
            );
            (Status::Pending, Some(note))
        }
        // REJECT, or malformed block metadata: fail closed.
        _ => (Status::Rejected, None),
    }
}

/// Pure validation and sanitization of the submission form.
pub fn validate_submission(input: &SubmitInput) -> ActionResult<ValidSubmission> {
    // Length is judged on what the visitor typed; escaping for storage can
    // only inflate it.
    machines::validate_title(input.title.trim())
        .map_err(|e| ActionError::Validation(e.to_string()))?;
    let title = sanitize_inline(&input.title);

    let section: Section = input
        .section
        .parse()
        .map_err(|_| ActionError::Validation("Invalid section".to_string()))?;
    if !section.is_public() {
        return Err(ActionError::Validation(
            "That section is not open for submissions".to_string(),
        ));
    }

    let description = sanitize_rich_text(&input.description);
    if description.trim().is_empty() {
        return Err(ActionError::Validation("Description is required".to_string()));
    }
    if description.len() > MAX_DESC_BYTES {
        return Err(ActionError::Validation("Description is too long".to_string()));
    }

    let coords = machines::validate_coordinates(input.latitude, input.longitude)
        .map_err(|_| ActionError::InvalidCoordinates)?;

    // Event dates only mean something for HAPPENINGS.
    let event_date = if section == Section::Happenings {
        input.event_date
    } else {
        None
    };

    Ok(ValidSubmission {
        title,
        description,
        section,
        location: input
            .location
            .as_deref()
            .map(sanitize_inline)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(&s, MAX_LOCATION_CHARS)),
        latitude: coords.map(|c| c.latitude),
        longitude: coords.map(|c| c.longitude),
        location_name: input
            .location_name
            .as_deref()
            .map(sanitize_inline)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(&s, MAX_LOCATION_CHARS)),
        event_date,
    })
}

/// Handle a public tip submission.
pub async fn submit_post(deps: &ServerDeps, input: SubmitInput) -> ActionResult<SubmitOutcome> {
    // Pretend success, store nothing.
    if honeypot_tripped(input.website.as_deref()) {
        info!("Honeypot tripped on submission");
        return Ok(SubmitOutcome::SilentlyDropped);
    }

    let valid = validate_submission(&input)?;

    let submitter = Submitter::find_or_create(input.submitter_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;

    let (status, flag_note) = route_submission(&submitter);

    let post = Post::create(
        CreatePost::builder()
            .title(valid.title)
            .description(valid.description)
            .section(valid.section)
            .status(Some(status))
            .submitter_id(Some(submitter.id))
            .location(valid.location)
            .latitude(valid.latitude)
            .longitude(valid.longitude)
            .location_name(valid.location_name)
            .event_date(valid.event_date)
            .build(),
        &deps.db_pool,
    )
    .await
    .map_err(ActionError::Internal)?;

    // Flagged posts surface at the top of the queue: urgent plus a note
    // explaining why. Both are best-effort; the post itself already exists.
    if let Some(note) = flag_note {
        if let Err(e) = Post::set_mod_note(post.id, Some(&note), &deps.db_pool).await {
            warn!(post_id = %post.id, error = %e, "Failed to attach flag note");
        }
        if let Err(e) = Post::toggle_urgent(post.id, &deps.db_pool).await {
            warn!(post_id = %post.id, error = %e, "Failed to mark flagged post urgent");
        }
    }

    info!(post_id = %post.id, section = %post.section, status = %post.status, "Tip submitted");

    // Analysis is advisory and detached: the submitter's response does not
    // wait on it, and rejected posts are not worth the provider call.
    if status == Status::Pending {
        ai_assist::dispatch_analysis(deps, post.id);
    }

    Ok(SubmitOutcome::Accepted {
        post_id: post.id,
        submitter_id: submitter.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> SubmitInput {
        SubmitInput {
            title: "Lost tabby cat".to_string(),
            description: "<p>Last seen near Elm St.</p>".to_string(),
            section: "LOST_FOUND".to_string(),
            location: Some("Elm St".to_string()),
            latitude: None,
            longitude: None,
            location_name: None,
            event_date: None,
            website: None,
            submitter_id: None,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        let valid = validate_submission(&base_input()).unwrap();
        assert_eq!(valid.section, Section::LostFound);
        assert_eq!(valid.description, "<p>Last seen near Elm St.</p>");
    }

    #[test]
    fn test_board_notes_rejected_from_public_form() {
        let mut input = base_input();
        input.section = "BOARD_NOTES".to_string();
        assert!(matches!(
            validate_submission(&input),
            Err(ActionError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let mut input = base_input();
        input.section = "CLASSIFIEDS".to_string();
        assert!(validate_submission(&input).is_err());
    }

    #[test]
    fn test_partial_coordinates_rejected() {
        let mut input = base_input();
        input.latitude = Some(45.0);
        assert!(matches!(
            validate_submission(&input),
            Err(ActionError::InvalidCoordinates)
        ));
    }

    #[test]
    fn test_description_is_sanitized() {
        let mut input = base_input();
        input.description = "<script>alert(1)</script><p>hi</p>".to_string();
        let valid = validate_submission(&input).unwrap();
        assert_eq!(valid.description, "<p>hi</p>");
    }

    #[test]
    fn test_event_date_dropped_outside_happenings() {
        let mut input = base_input();
        input.event_date = Some(Utc::now());
        let valid = validate_submission(&input).unwrap();
        assert!(valid.event_date.is_none());

        input.section = "HAPPENINGS".to_string();
        let valid = validate_submission(&input).unwrap();
        assert!(valid.event_date.is_some());
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut input = base_input();
        input.description = "<script>only scripts</script>".to_string();
        assert!(validate_submission(&input).is_err());
    }

    #[test]
    fn test_title_length_counted_before_escaping() {
        // 97 visitor-typed chars; escaping the ampersand would push the
        // stored form past 100. The raw length is what counts.
        let mut input = base_input();
        input.title = format!("{} & b", "a".repeat(93));
        assert_eq!(input.title.chars().count(), 97);
        let valid = validate_submission(&input).unwrap();
        assert!(valid.title.contains("&amp;"));

        input.title = "a".repeat(101);
        assert!(matches!(
            validate_submission(&input),
            Err(ActionError::Validation(_))
        ));
    }

    #[test]
    fn test_honeypot_only_trips_on_content() {
        assert!(!honeypot_tripped(None));
        assert!(!honeypot_tripped(Some("")));
        assert!(!honeypot_tripped(Some("   ")));
        assert!(honeypot_tripped(Some("https://spam.example")));
    }

    fn submitter(blocked: bool, action: Option<&str>, reason: Option<&str>) -> Submitter {
        Submitter {
            id: SubmitterId::new(),
            blocked,
            block_action: action.map(String::from),
            block_reason: reason.map(String::from),
            blocked_at: None,
            blocked_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unblocked_submitter_enters_queue_clean() {
        let (status, note) = route_submission(&submitter(false, None, None));
        assert_eq!(status, Status::Pending);
        assert!(note.is_none());
    }

    #[test]
    fn test_reject_blocked_submitter_lands_in_rejected() {
        let (status, note) = route_submission(&submitter(true, Some("REJECT"), Some("spam")));
        assert_eq!(status, Status::Rejected);
        assert!(note.is_none());
    }

    #[test]
    fn test_flag_blocked_submitter_enters_queue_with_note() {
        let (status, note) =
            route_submission(&submitter(true, Some("FLAG"), Some("repeat offender")));
        assert_eq!(status, Status::Pending);
        assert_eq!(
            note.as_deref(),
            Some("Auto-flagged: submitter is blocked (repeat offender)")
        );

        let (_, note) = route_submission(&submitter(true, Some("FLAG"), None));
        assert_eq!(
            note.as_deref(),
            Some("Auto-flagged: submitter is blocked (no reason recorded)")
        );
    }

    #[test]
    fn test_malformed_block_metadata_fails_closed() {
        for action in [None, Some("BANHAMMER")] {
            let (status, note) = route_submission(&submitter(true, action, None));
            assert_eq!(status, Status::Rejected);
            assert!(note.is_none());
        }
    }
}
