/// Pure helpers for plain-text fields (titles, location names, notes).
///
/// These functions contain NO side effects - they take inputs and return
/// outputs without touching databases or performing I/O.

/// Escape and trim a single-line plain text field.
///
/// Titles and location names never carry markup, so angle brackets are
/// escaped rather than parsed.
pub fn sanitize_inline(input: &str) -> String {
    input
        .trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render how long ago a timestamp was, dashboard-style.
pub fn time_ago(from: chrono::DateTime<chrono::Utc>, now: chrono::DateTime<chrono::Utc>) -> String {
    let elapsed = now.signed_duration_since(from);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", elapsed.num_days())
}

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis when anything was cut.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let kept: String = input.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}\u{2026}", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_inline_escapes_markup() {
        assert_eq!(
            sanitize_inline("  <b>Lost dog</b> & cat  "),
            "&lt;b&gt;Lost dog&lt;/b&gt; &amp; cat"
        );
    }

    #[test]
    fn test_truncate_chars_short_input_unchanged() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_truncate_chars_cuts_with_ellipsis() {
        let out = truncate_chars(&"a".repeat(120), 100);
        assert_eq!(out.chars().count(), 100);
        assert!(out.ends_with('\u{2026}'));
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        let out = truncate_chars(&"日".repeat(50), 10);
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn test_time_ago_buckets() {
        use chrono::{Duration, TimeZone, Utc};
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::seconds(30), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2d ago");
    }
}
