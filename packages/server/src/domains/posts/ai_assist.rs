//! AI assist adapter for the posts domain
//!
//! Wraps LLM calls for tip analysis and text rewrite. Both operations are
//! advisory: any provider error, timeout or malformed response degrades to
//! `None`, never an error that escapes to the caller. Model responses are
//! untrusted payloads and are validated against a fixed schema.

use anyhow::Result;
use openrouter_client::strip_code_blocks;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::PostId;
use crate::common::utils::richtext::strip_html;
use crate::domains::posts::machines::Section;
use crate::domains::posts::models::Post;
use crate::domains::settings::models::SiteSettings;
use crate::kernel::ServerDeps;

/// Rewrite caps enforced on anything the model returns.
pub const REWRITE_TITLE_CAP: usize = 100;
pub const REWRITE_DESC_CAP: usize = 500;

const ANALYSIS_TEMPERATURE: f32 = 0.2;
const REWRITE_TEMPERATURE: f32 = 0.7;

/// Default rewrite directive when the moderator gives no instructions and
/// site settings carry no custom prompt.
pub const DEFAULT_REWRITE_INSTRUCTIONS: &str =
    "Clean up the text, keep a neutral tone, and remove any personal identifying information.";

// =============================================================================
// Analysis result schema
// =============================================================================

/// Sections the model may suggest. BOARD_NOTES is deliberately absent: a
/// suggestion of BOARD_NOTES is a schema violation and fails the parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedSection {
    Alert,
    Happenings,
    LostFound,
    Neighbors,
}

impl From<SuggestedSection> for Section {
    fn from(s: SuggestedSection) -> Self {
        match s {
            SuggestedSection::Alert => Section::Alert,
            SuggestedSection::Happenings => Section::Happenings,
            SuggestedSection::LostFound => Section::LostFound,
            SuggestedSection::Neighbors => Section::Neighbors,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisUrgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Neutral,
    Concerned,
    Urgent,
    Positive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approve,
    Flag,
    Reject,
}

/// Suggested neutral-toned rewrite of title and description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteSuggestion {
    pub title: String,
    pub desc: String,
}

/// Structured result of tip analysis. Stored on the post as advisory
/// metadata for the moderation queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub suggested_section: SuggestedSection,
    pub urgency: AnalysisUrgency,
    pub pii_detected: Vec<String>,
    pub rewrite: RewriteSuggestion,
    pub sentiment: Sentiment,
    pub recommendation: Recommendation,
    pub reasoning: String,
}

// =============================================================================
// Prompts
// =============================================================================

/// Build the fixed-schema analysis prompt for a submitted tip.
pub fn build_analysis_prompt(title: &str, plain_desc: &str, location: Option<&str>) -> String {
    let location_line = match location {
        Some(loc) if !loc.trim().is_empty() => format!("Location: {}\n", loc.trim()),
        _ => String::new(),
    };

    format!(
        "You are a content moderator for a neighborhood bulletin board. \
Analyze the following anonymous tip and respond with ONLY a JSON object, no other text.\n\
\n\
Tip title: {title}\n\
{location_line}Tip text: {plain_desc}\n\
\n\
Respond with this exact JSON shape:\n\
{{\n\
  \"suggestedSection\": \"ALERT\" | \"HAPPENINGS\" | \"LOST_FOUND\" | \"NEIGHBORS\",\n\
  \"urgency\": \"LOW\" | \"MEDIUM\" | \"HIGH\",\n\
  \"piiDetected\": [\"list of personal-information categories found, empty if none\"],\n\
  \"rewrite\": {{ \"title\": \"neutral-toned rewrite of the title\", \"desc\": \"neutral-toned rewrite of the text\" }},\n\
  \"sentiment\": \"NEUTRAL\" | \"CONCERNED\" | \"URGENT\" | \"POSITIVE\",\n\
  \"recommendation\": \"APPROVE\" | \"FLAG\" | \"REJECT\",\n\
  \"reasoning\": \"one sentence explaining the recommendation\"\n\
}}\n\
\n\
Do not store, log, or learn from this content. It is private community data \
provided for this single moderation decision only."
    )
}

/// Build the rewrite prompt. `custom_prompt` from site settings replaces the
/// built-in default directive; explicit moderator instructions override both.
pub fn build_rewrite_prompt(
    title: &str,
    plain_desc: &str,
    instructions: Option<&str>,
    custom_prompt: Option<&str>,
) -> String {
    let directive = instructions
        .filter(|s| !s.trim().is_empty())
        .or(custom_prompt.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_REWRITE_INSTRUCTIONS);

    format!(
        "You edit posts for a neighborhood bulletin board.\n\
Instructions: {directive}\n\
\n\
Original title: {title}\n\
Original text: {plain_desc}\n\
\n\
Respond with ONLY a JSON object: {{ \"title\": \"...\", \"desc\": \"...\" }}\n\
Keep the title under {title_cap} characters and the text under {desc_cap} characters.\n\
\n\
Do not store, log, or learn from this content. It is private community data \
provided for this single rewrite only.",
        title_cap = REWRITE_TITLE_CAP,
        desc_cap = REWRITE_DESC_CAP,
    )
}

// =============================================================================
// Response parsing
// =============================================================================

/// Parse an analysis response. Any shape mismatch yields `None`.
pub fn parse_analysis(response: &str) -> Option<AnalysisResult> {
    serde_json::from_str(strip_code_blocks(response)).ok()
}

/// Parse a rewrite response. Any shape mismatch yields `None`.
pub fn parse_rewrite(response: &str) -> Option<RewriteSuggestion> {
    serde_json::from_str::<RewriteSuggestion>(strip_code_blocks(response))
        .ok()
        .map(cap_rewrite)
}

/// Enforce the length caps on a rewrite regardless of what the model said.
pub fn cap_rewrite(rewrite: RewriteSuggestion) -> RewriteSuggestion {
    RewriteSuggestion {
        title: rewrite.title.chars().take(REWRITE_TITLE_CAP).collect(),
        desc: rewrite.desc.chars().take(REWRITE_DESC_CAP).collect(),
    }
}

// =============================================================================
// Orchestration over ServerDeps
// =============================================================================

/// Analyze a post. Returns `None` when AI is unconfigured, the provider
/// fails, or the response does not match the schema.
pub async fn analyze_post(deps: &ServerDeps, post: &Post) -> Option<AnalysisResult> {
    let ai = deps.ai.as_ref()?;

    let settings = match SiteSettings::load(&deps.db_pool).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "Failed to load settings for analysis");
            return None;
        }
    };

    let prompt = build_analysis_prompt(
        &post.title,
        &strip_html(&post.description),
        post.location.as_deref(),
    );

    match ai
        .complete(&settings.analysis_model, &prompt, ANALYSIS_TEMPERATURE)
        .await
    {
        Ok(response) => {
            let parsed = parse_analysis(&response);
            if parsed.is_none() {
                warn!(post_id = %post.id, "Analysis response failed schema validation");
            }
            parsed
        }
        Err(e) => {
            warn!(post_id = %post.id, error = %e, "Analysis call failed");
            None
        }
    }
}

/// Rewrite arbitrary title/description text. Returns `None` on any failure.
pub async fn rewrite_text(
    deps: &ServerDeps,
    title: &str,
    description: &str,
    instructions: Option<&str>,
) -> Option<RewriteSuggestion> {
    let ai = deps.ai.as_ref()?;

    let settings = match SiteSettings::load(&deps.db_pool).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "Failed to load settings for rewrite");
            return None;
        }
    };

    let prompt = build_rewrite_prompt(
        title,
        &strip_html(description),
        instructions,
        settings.rewrite_prompt.as_deref(),
    );

    match ai
        .complete(&settings.rewrite_model, &prompt, REWRITE_TEMPERATURE)
        .await
    {
        Ok(response) => {
            let parsed = parse_rewrite(&response);
            if parsed.is_none() {
                warn!("Rewrite response failed schema validation");
            }
            parsed
        }
        Err(e) => {
            warn!(error = %e, "Rewrite call failed");
            None
        }
    }
}

/// Run analysis for a post and persist the result. Failures are logged only.
pub async fn run_analysis(deps: &ServerDeps, post_id: PostId) -> Result<()> {
    let Some(post) = Post::find_by_id(post_id, &deps.db_pool).await? else {
        warn!(post_id = %post_id, "Post vanished before analysis ran");
        return Ok(());
    };

    let Some(analysis) = analyze_post(deps, &post).await else {
        debug!(post_id = %post_id, "No analysis produced");
        return Ok(());
    };

    Post::set_analysis(post_id, &analysis, &deps.db_pool).await?;
    debug!(post_id = %post_id, recommendation = ?analysis.recommendation, "Analysis stored");
    Ok(())
}

/// Fire-and-forget analysis dispatch. The submitter's request never waits
/// on this, and failures are swallowed after logging. No automatic retry;
/// a moderator can reanalyze manually.
pub fn dispatch_analysis(deps: &ServerDeps, post_id: PostId) {
    if deps.ai.is_none() {
        return;
    }
    let deps_clone = deps.clone();
    deps.tasks.dispatch(
        "analyze_post",
        Box::pin(async move {
            if let Err(e) = run_analysis(&deps_clone, post_id).await {
                warn!(post_id = %post_id, error = %e, "Background analysis failed");
            }
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis_json() -> &'static str {
        r#"{
            "suggestedSection": "LOST_FOUND",
            "urgency": "LOW",
            "piiDetected": ["phone number"],
            "rewrite": {"title": "Lost tabby cat", "desc": "A tabby cat was lost near Elm St."},
            "sentiment": "CONCERNED",
            "recommendation": "APPROVE",
            "reasoning": "Genuine lost pet report with no policy issues."
        }"#
    }

    #[test]
    fn test_parse_analysis_plain_json() {
        let result = parse_analysis(sample_analysis_json()).unwrap();
        assert_eq!(result.suggested_section, SuggestedSection::LostFound);
        assert_eq!(result.recommendation, Recommendation::Approve);
        assert_eq!(result.pii_detected, vec!["phone number"]);
    }

    #[test]
    fn test_parse_analysis_strips_code_fences() {
        let fenced = format!("```json\n{}\n```", sample_analysis_json());
        assert!(parse_analysis(&fenced).is_some());
    }

    #[test]
    fn test_parse_analysis_rejects_board_notes_suggestion() {
        let bad = sample_analysis_json().replace("LOST_FOUND", "BOARD_NOTES");
        assert!(parse_analysis(&bad).is_none());
    }

    #[test]
    fn test_parse_analysis_rejects_missing_fields() {
        assert!(parse_analysis(r#"{"suggestedSection": "ALERT"}"#).is_none());
        assert!(parse_analysis("not json at all").is_none());
    }

    #[test]
    fn test_parse_rewrite_caps_lengths() {
        let long = format!(
            r#"{{"title": "{}", "desc": "{}"}}"#,
            "t".repeat(150),
            "d".repeat(800)
        );
        let rewrite = parse_rewrite(&long).unwrap();
        assert_eq!(rewrite.title.chars().count(), REWRITE_TITLE_CAP);
        assert_eq!(rewrite.desc.chars().count(), REWRITE_DESC_CAP);
    }

    #[test]
    fn test_analysis_prompt_contains_privacy_clause() {
        let prompt = build_analysis_prompt("Title", "Body", Some("Elm St"));
        assert!(prompt.contains("Do not store, log, or learn from this content"));
        assert!(prompt.contains("Location: Elm St"));
        // The model must never be offered BOARD_NOTES.
        assert!(!prompt.contains("BOARD_NOTES"));
    }

    #[tokio::test]
    async fn test_analysis_round_trip_through_mock_provider() {
        use crate::kernel::{BaseAI, MockAI};

        let ai = MockAI::new().with_response(format!("```json\n{}\n```", sample_analysis_json()));
        let prompt =
            build_analysis_prompt("Lost tabby cat", "Last seen near Elm St.", Some("Elm St"));
        let response = ai.complete("test-model", &prompt, 0.2).await.unwrap();

        let analysis = parse_analysis(&response).unwrap();
        assert_eq!(analysis.suggested_section, SuggestedSection::LostFound);
        assert_eq!(ai.call_count(), 1);
        assert!(ai.was_called_with("Do not store, log, or learn from this content"));
    }

    #[tokio::test]
    async fn test_rewrite_round_trip_caps_through_mock_provider() {
        use crate::kernel::{BaseAI, MockAI};

        let ai = MockAI::new().with_json_response(&RewriteSuggestion {
            title: "t".repeat(150),
            desc: "d".repeat(800),
        });
        let prompt = build_rewrite_prompt("Loud party", "Music all night.", None, None);
        let response = ai.complete("test-model", &prompt, 0.7).await.unwrap();

        let rewrite = parse_rewrite(&response).unwrap();
        assert_eq!(rewrite.title.chars().count(), REWRITE_TITLE_CAP);
        assert_eq!(rewrite.desc.chars().count(), REWRITE_DESC_CAP);
        assert!(ai
            .last_prompt()
            .is_some_and(|p| p.contains(DEFAULT_REWRITE_INSTRUCTIONS)));
    }

    #[test]
    fn test_rewrite_prompt_precedence() {
        let with_instructions =
            build_rewrite_prompt("T", "D", Some("make it shorter"), Some("site prompt"));
        assert!(with_instructions.contains("make it shorter"));
        assert!(!with_instructions.contains("site prompt"));

        let with_custom = build_rewrite_prompt("T", "D", None, Some("site prompt"));
        assert!(with_custom.contains("site prompt"));

        let default = build_rewrite_prompt("T", "D", None, None);
        assert!(default.contains(DEFAULT_REWRITE_INSTRUCTIONS));
    }
}
