//! Read-side projections of the post set.
//!
//! The public board and the moderation dashboard are derived views: filter,
//! group and sort over rows the models fetched. No independent state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::utils::richtext::strip_html;
use crate::common::utils::text::{time_ago, truncate_chars};
use crate::common::{PostId, SubmitterId};
use crate::domains::posts::ai_assist::AnalysisResult;
use crate::domains::posts::machines::Section;
use crate::domains::posts::models::Post;

/// Public view of a live post. Carries nothing a visitor should not see:
/// no moderator note, no analysis, no submitter linkage.
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub section: String,
    pub location: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pinned: bool,
    pub urgent: bool,
    pub event_date: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<&Post> for PostData {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            description: post.description.clone(),
            section: post.section.clone(),
            location: post.location.clone(),
            location_name: post.location_name.clone(),
            latitude: post.latitude,
            longitude: post.longitude,
            pinned: post.pinned,
            urgent: post.urgent,
            event_date: post.event_date,
            approved_at: post.approved_at,
        }
    }
}

/// Moderator view of a post: everything, including advisory metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ModPostData {
    pub id: PostId,
    pub submitter_id: Option<SubmitterId>,
    pub title: String,
    pub description: String,
    /// Plain-text snippet for queue list rows.
    pub preview: String,
    /// Human "3h ago" age of the submission.
    pub created_ago: String,
    pub section: String,
    pub status: String,
    pub location: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pinned: bool,
    pub urgent: bool,
    pub mod_note: Option<String>,
    pub mod_post: bool,
    pub ai_analysis: Option<AnalysisResult>,
    pub rewrite_count: i32,
    pub history_len: usize,
    pub event_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Post> for ModPostData {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            submitter_id: post.submitter_id,
            title: post.title.clone(),
            description: post.description.clone(),
            preview: truncate_chars(&strip_html(&post.description), 160),
            created_ago: time_ago(post.created_at, Utc::now()),
            section: post.section.clone(),
            status: post.status.clone(),
            location: post.location.clone(),
            location_name: post.location_name.clone(),
            latitude: post.latitude,
            longitude: post.longitude,
            pinned: post.pinned,
            urgent: post.urgent,
            mod_note: post.mod_note.clone(),
            mod_post: post.mod_post,
            ai_analysis: post.ai_analysis.as_ref().map(|a| a.0.clone()),
            rewrite_count: post.rewrite_count,
            history_len: post.desc_history.0.len(),
            event_date: post.event_date,
            created_at: post.created_at,
            approved_at: post.approved_at,
            edited_at: post.edited_at,
            expires_at: post.expires_at,
        }
    }
}

/// One section of the public board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSection {
    pub section: String,
    pub posts: Vec<PostData>,
}

/// The public board: live posts grouped by section in display order.
/// Empty sections are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct BoardData {
    pub sections: Vec<BoardSection>,
}

impl BoardData {
    /// Group live posts by section, preserving the input ordering within
    /// each section (models sort pinned-first, newest approvals first).
    pub fn from_posts(posts: &[Post]) -> Self {
        let sections = Section::DISPLAY_ORDER
            .iter()
            .filter_map(|section| {
                let name = section.to_string();
                let posts: Vec<PostData> = posts
                    .iter()
                    .filter(|p| p.section == name)
                    .map(PostData::from)
                    .collect();
                if posts.is_empty() {
                    None
                } else {
                    Some(BoardSection { section: name, posts })
                }
            })
            .collect();
        Self { sections }
    }
}

/// The moderation dashboard: queue, board and archive in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub pending: Vec<ModPostData>,
    pub live: Vec<ModPostData>,
    pub archive: Vec<ModPostData>,
}

impl DashboardData {
    pub fn new(pending: &[Post], live: &[Post], archive: &[Post]) -> Self {
        Self {
            pending: pending.iter().map(ModPostData::from).collect(),
            live: live.iter().map(ModPostData::from).collect(),
            archive: archive.iter().map(ModPostData::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::types::Json;

    use crate::domains::posts::machines::Status;

    fn live_post(section: Section, title: &str) -> Post {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Post {
            id: PostId::new(),
            submitter_id: None,
            title: title.to_string(),
            description: "<p>body</p>".to_string(),
            location: None,
            latitude: None,
            longitude: None,
            location_name: None,
            section: section.to_string(),
            status: Status::Live.to_string(),
            event_date: None,
            pinned: false,
            urgent: false,
            mod_note: Some("private".to_string()),
            mod_post: false,
            ai_analysis: None,
            rewrite_count: 0,
            desc_history: Json(Vec::new()),
            created_at: now,
            approved_at: Some(now),
            edited_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_board_groups_by_display_order() {
        let posts = vec![
            live_post(Section::Neighbors, "n1"),
            live_post(Section::Alert, "a1"),
            live_post(Section::Neighbors, "n2"),
        ];
        let board = BoardData::from_posts(&posts);

        assert_eq!(board.sections.len(), 2);
        assert_eq!(board.sections[0].section, "ALERT");
        assert_eq!(board.sections[1].section, "NEIGHBORS");
        assert_eq!(board.sections[1].posts.len(), 2);
        // Input order preserved within a section.
        assert_eq!(board.sections[1].posts[0].title, "n1");
    }

    #[test]
    fn test_board_omits_empty_sections() {
        let board = BoardData::from_posts(&[]);
        assert!(board.sections.is_empty());
    }

    #[test]
    fn test_mod_view_preview_is_plain_text() {
        let mut post = live_post(Section::Alert, "a1");
        post.description = format!("<p><strong>Water</strong> main break.</p><p>{}</p>", "x".repeat(300));
        let data = ModPostData::from(&post);
        assert!(data.preview.starts_with("Water main break."));
        assert!(!data.preview.contains('<'));
        assert!(data.preview.chars().count() <= 160);
    }

    #[test]
    fn test_public_view_serializes_no_mod_note() {
        let post = live_post(Section::Alert, "a1");
        let json = serde_json::to_value(PostData::from(&post)).unwrap();
        assert!(json.get("mod_note").is_none());
        assert!(json.get("submitter_id").is_none());
        assert!(json.get("ai_analysis").is_none());
    }
}
