//! Display formatting shared by the entry list and the recorder.

use chrono::{DateTime, Utc};

const PREVIEW_CHARS: usize = 100;

/// Renders seconds as `M:SS`. Non-finite or negative input renders as `0:00`;
/// fractional seconds are dropped.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Short list-view preview: leading text, else a label for the attached media.
pub fn entry_preview(
    content: Option<&str>,
    audio_url: Option<&str>,
    image_url: Option<&str>,
) -> String {
    if let Some(content) = content.filter(|c| !c.is_empty()) {
        if content.chars().count() > PREVIEW_CHARS {
            let head: String = content.chars().take(PREVIEW_CHARS).collect();
            return format!("{head}...");
        }
        return content.to_string();
    }
    if audio_url.is_some_and(|u| !u.is_empty()) {
        return "Audio recording".to_string();
    }
    if image_url.is_some_and(|u| !u.is_empty()) {
        return "Photo entry".to_string();
    }
    "No content".to_string()
}

/// `Tuesday, March 5, 2024`
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}

/// `3:07 PM`
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration_basic() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.0), "0:05");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(600.0), "10:00");
        assert_eq!(format_duration(3725.0), "62:05");
    }

    #[test]
    fn test_format_duration_invalid_values() {
        assert_eq!(format_duration(f64::INFINITY), "0:00");
        assert_eq!(format_duration(f64::NEG_INFINITY), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
        assert_eq!(format_duration(-1.0), "0:00");
    }

    #[test]
    fn test_format_duration_drops_fraction() {
        assert_eq!(format_duration(59.9), "0:59");
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let long = "a".repeat(150);
        let preview = entry_preview(Some(&long), None, None);
        assert_eq!(preview.len(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_keeps_short_content() {
        assert_eq!(entry_preview(Some("hello"), Some("u"), None), "hello");
    }

    #[test]
    fn test_preview_media_labels() {
        assert_eq!(entry_preview(None, Some("https://a"), Some("https://b")), "Audio recording");
        assert_eq!(entry_preview(None, None, Some("https://b")), "Photo entry");
        assert_eq!(entry_preview(None, None, None), "No content");
    }

    #[test]
    fn test_date_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 15, 7, 0).unwrap();
        assert_eq!(format_date(&at), "Tuesday, March 5, 2024");
        assert_eq!(format_time(&at), "3:07 PM");
    }
}
