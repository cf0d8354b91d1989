//! Mnemonic job IDs: a 2-3 letter prefix derived from the reminder's own
//! message, plus the smallest unused numeric suffix. `"tomar remedio as 8"`
//! becomes `RM01`, not a UUID — so a user can recognize and talk about a
//! job by its id in a chat.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Keyword → prefix table, longest/most-specific entries first so a more
/// precise phrase wins over a generic one. Covers the handful of reminder
/// categories people actually create in pt-BR, pt-PT, es and en.
const KEYWORDS: &[(&str, &str)] = &[
    ("remedio", "RM"),
    ("remédio", "RM"),
    ("medicamento", "RM"),
    ("medicina", "RM"),
    ("medicacion", "RM"),
    ("pastilla", "RM"),
    ("medicine", "RM"),
    ("medication", "RM"),
    ("pill", "RM"),
    ("reuniao", "RU"),
    ("reunião", "RU"),
    ("reunion", "RU"),
    ("meeting", "RU"),
    ("aniversario", "AN"),
    ("aniversário", "AN"),
    ("cumpleanos", "AN"),
    ("cumpleaños", "AN"),
    ("birthday", "AN"),
    ("ligar", "LG"),
    ("chamada", "LG"),
    ("llamar", "LG"),
    ("llamada", "LG"),
    ("call", "LG"),
    ("pagar conta", "PG"),
    ("pagar cuenta", "PG"),
    ("pagar boleto", "PG"),
    ("pay bill", "PG"),
    ("fatura", "PG"),
    ("factura", "PG"),
    ("consulta", "CN"),
    ("appointment", "CN"),
    ("medico", "CN"),
    ("médico", "CN"),
    ("doctor", "CN"),
    ("dentista", "DN"),
    ("dentist", "DN"),
    ("beber agua", "AG"),
    ("tomar agua", "AG"),
    ("beber água", "AG"),
    ("drink water", "AG"),
    ("agua", "AG"),
    ("água", "AG"),
    ("exercicio", "EX"),
    ("exercício", "EX"),
    ("ejercicio", "EX"),
    ("academia", "EX"),
    ("gym", "EX"),
    ("exercise", "EX"),
    ("workout", "EX"),
    ("mercado", "MK"),
    ("compras", "MK"),
    ("supermercado", "MK"),
    ("shopping", "MK"),
    ("groceries", "MK"),
    ("estudar", "ES"),
    ("estudiar", "ES"),
    ("study", "ES"),
    ("prova", "ES"),
    ("exam", "ES"),
    ("trabalho", "TB"),
    ("trabajo", "TB"),
    ("work", "TB"),
    ("viagem", "VG"),
    ("viaje", "VG"),
    ("trip", "VG"),
    ("travel", "VG"),
    ("voo", "VO"),
    ("vuelo", "VO"),
    ("flight", "VO"),
    ("entrega", "EN"),
    ("delivery", "EN"),
    ("pacote", "EN"),
    ("package", "EN"),
    ("limpeza", "LP"),
    ("limpieza", "LP"),
    ("cleaning", "LP"),
    ("filme", "FL"),
    ("pelicula", "FL"),
    ("película", "FL"),
    ("movie", "FL"),
    ("festa", "FS"),
    ("fiesta", "FS"),
    ("party", "FS"),
];

/// Stopwords skipped by the fallback word-scan. Articles, prepositions and
/// verbs that say nothing about the reminder's content.
const STOPWORDS: &[&str] = &[
    "hora", "de", "do", "da", "das", "dos", "lembrar", "tomar", "comprar", "fazer", "beber",
    "ir", "para", "as", "as", "ao", "no", "na", "em", "um", "uma", "o", "a", "e", "el", "la",
    "los", "las", "un", "una", "y", "the", "to", "at", "for", "and",
];

const ULTIMATE_FALLBACK: &str = "LM";

/// NFD-decompose and strip combining marks, so `"remédio"` and `"remedio"`
/// match the same keyword regardless of how the accent was typed.
fn normalize(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn prefix_from_keywords(normalized: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| normalized.contains(kw))
        .map(|(_, prefix)| *prefix)
}

fn prefix_from_first_word(normalized: &str) -> String {
    for word in normalized.split(|c: char| !c.is_alphanumeric()) {
        if word.len() < 2 {
            continue;
        }
        if STOPWORDS.contains(&word) {
            continue;
        }
        if !word.chars().next().is_some_and(|c| c.is_alphabetic()) {
            continue;
        }
        let upper: String = word.chars().take(3).collect::<String>().to_uppercase();
        return upper;
    }
    ULTIMATE_FALLBACK.to_string()
}

fn sanitize_prefix(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .take(3)
        .collect();
    if cleaned.is_empty() {
        return ULTIMATE_FALLBACK.to_string();
    }
    if cleaned.len() < 2 {
        let mut padded = cleaned;
        while padded.len() < 2 {
            padded.push('X');
        }
        return padded;
    }
    cleaned
}

/// Derive the mnemonic prefix for a reminder message. Keyword match first,
/// then the first significant word, then `"LM"`.
pub fn prefix_from_message(message: &str) -> String {
    let normalized = normalize(message);
    let raw = prefix_from_keywords(&normalized)
        .map(String::from)
        .unwrap_or_else(|| prefix_from_first_word(&normalized));
    sanitize_prefix(&raw)
}

/// Generate a collision-free id: `prefix` plus the smallest unused numeric
/// suffix, 2 digits first and overflowing to 3 only once 01-99 is exhausted.
pub fn generate_friendly_job_id(message: &str, existing_ids: &HashSet<String>) -> String {
    let prefix = prefix_from_message(message);
    generate_with_prefix(&prefix, existing_ids)
}

pub fn generate_with_prefix(prefix: &str, existing_ids: &HashSet<String>) -> String {
    for n in 1..=99u32 {
        let candidate = format!("{prefix}{n:02}");
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
    }
    for n in 1..=999u32 {
        let candidate = format!("{prefix}{n:03}");
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
    }
    // Exhausted the 3-digit space — should never happen at realistic job
    // counts. Keep growing the suffix rather than panic or collide.
    let mut n = 1000u32;
    loop {
        let candidate = format!("{prefix}{n}");
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keyword_regardless_of_accent() {
        assert_eq!(prefix_from_message("tomar remedio as 8"), "RM");
        assert_eq!(prefix_from_message("tomar remédio às 8"), "RM");
    }

    #[test]
    fn falls_back_to_first_significant_word() {
        // no keyword match; "regar" (2nd word "as plantas" has stopword "as")
        let prefix = prefix_from_message("regar as plantas");
        assert_eq!(prefix, "REG");
    }

    #[test]
    fn ultimate_fallback_is_lm() {
        assert_eq!(prefix_from_message("as de do"), "LM");
    }

    #[test]
    fn ids_avoid_collisions_and_overflow_to_three_digits() {
        let mut existing = HashSet::new();
        for n in 1..=99u32 {
            existing.insert(format!("RM{n:02}"));
        }
        let id = generate_with_prefix("RM", &existing);
        assert_eq!(id, "RM001");
    }
}
