/// Maps a spelled-out language name to its ISO-639-1 code. Passthrough for anything already
/// a two-letter code, and for names the table doesn't recognize.
pub fn normalize_language_code(language: Option<&str>) -> Option<String> {
    let language = language?;
    let trimmed = language.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if lower.len() == 2 && lower.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(lower);
    }

    Some(code_for_name(&lower).unwrap_or(lower))
}

fn code_for_name(name: &str) -> Option<String> {
    let code = match name {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "japanese" => "ja",
        "korean" => "ko",
        "chinese" => "zh",
        "arabic" => "ar",
        "hindi" => "hi",
        "dutch" => "nl",
        "polish" => "pl",
        "turkish" => "tr",
        "vietnamese" => "vi",
        "thai" => "th",
        "greek" => "el",
        "czech" => "cs",
        "swedish" => "sv",
        "norwegian" => "no",
        "danish" => "da",
        "finnish" => "fi",
        "hungarian" => "hu",
        "romanian" => "ro",
        "ukrainian" => "uk",
        "hebrew" => "he",
        "indonesian" => "id",
        "malay" => "ms",
        "tagalog" => "tl",
        _ => return None,
    };
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_spelled_out_name() {
        assert_eq!(normalize_language_code(Some("English")), Some("en".to_string()));
    }

    #[test]
    fn passes_through_existing_code() {
        assert_eq!(normalize_language_code(Some("fr")), Some("fr".to_string()));
    }

    #[test]
    fn passes_through_unrecognized_name() {
        assert_eq!(
            normalize_language_code(Some("klingon")),
            Some("klingon".to_string())
        );
    }

    #[test]
    fn none_for_absent_or_blank() {
        assert_eq!(normalize_language_code(None), None);
        assert_eq!(normalize_language_code(Some("  ")), None);
    }
}
