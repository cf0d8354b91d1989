//! Small relative-time phrase parser shared by the reminder handler:
//! `"em 2 min"`, `"em 3 horas"`, `"em 1 dia"`.

use std::sync::OnceLock;

use regex::Regex;

static RELATIVE_RE: OnceLock<Regex> = OnceLock::new();

fn relative_re() -> &'static Regex {
    RELATIVE_RE.get_or_init(|| {
        Regex::new(r"(?i)\bem\s+(\d+)\s*(segundos?|segs?|minutos?|mins?|horas?|hrs?|h|dias?|d)\b").unwrap()
    })
}

/// Returns the number of seconds from now described by a phrase like
/// `"em 2 min"`, or `None` if no relative-time phrase is present.
pub fn parse_relative_seconds(text: &str) -> Option<i64> {
    let caps = relative_re().captures(text)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    let mult = if unit.starts_with("seg") {
        1
    } else if unit.starts_with("min") {
        60
    } else if unit.starts_with('h') {
        3600
    } else if unit.starts_with('d') {
        86_400
    } else {
        return None;
    };
    Some(n * mult)
}

/// True if `text` mentions a reminder at all (used to decide whether a
/// missing time expression should prompt for clarification rather than be
/// ignored).
pub fn mentions_reminder(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("lembrete") || lower.contains("lembra") || lower.starts_with("/lembrete")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_hours() {
        assert_eq!(parse_relative_seconds("beber agua em 2 min"), Some(120));
        assert_eq!(parse_relative_seconds("em 3 horas"), Some(10_800));
        assert_eq!(parse_relative_seconds("em 1 dia"), Some(86_400));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(parse_relative_seconds("me lembra de beber agua"), None);
    }
}
