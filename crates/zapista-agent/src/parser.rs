//! Structured parser (spec §4.3 step 2): recognizes slash-commands and a
//! small set of direct natural-language intents, short-circuiting straight
//! to the handler chain's own handling rather than going through the LLM.
//!
//! This module only classifies; it doesn't execute anything itself — the
//! handler chain (`zapista_handlers`) already knows how to answer every
//! recognized form. Its purpose is solely the spec's "attempt to parse...
//! recognized intents execute immediately" ordering: a recognized slash
//! command always reaches the handler chain before scope filtering runs.

/// A message the parser positively recognizes as an organizer command,
/// regardless of what the scope filter would have said.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedIntent {
    SlashCommand,
    NaturalLanguageReminder,
}

const SLASH_COMMANDS: &[&str] = &["/lembrete", "/list", "/feito", "/filme", "/help", "/start", "/ajuda"];

/// Returns `Some` when `text` is recognized as an organizer command that
/// should skip the scope filter entirely.
pub fn parse(text: &str) -> Option<ParsedIntent> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if SLASH_COMMANDS.iter().any(|cmd| lower.starts_with(cmd)) {
        return Some(ParsedIntent::SlashCommand);
    }

    if zapista_handlers::time_expr::mentions_reminder(&lower) {
        return Some(ParsedIntent::NaturalLanguageReminder);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_slash_commands() {
        assert_eq!(parse("/list mercado add leite"), Some(ParsedIntent::SlashCommand));
        assert_eq!(parse("/feito mercado 1"), Some(ParsedIntent::SlashCommand));
    }

    #[test]
    fn recognizes_natural_language_reminder() {
        assert_eq!(
            parse("me lembra de beber agua em 10 min"),
            Some(ParsedIntent::NaturalLanguageReminder)
        );
    }

    #[test]
    fn ignores_unrelated_chatter() {
        assert_eq!(parse("como vai voce"), None);
    }
}
