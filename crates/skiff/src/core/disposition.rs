use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::Headers;

// Deliberately narrow: quoted name of letters, dashes, underscores and
// dots, terminated by a semicolon. Anything fancier is left unextracted.
static FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename="([a-z\-_.]+)";"#).expect("filename pattern compiles"));

/// Pull an advertised filename out of a `Content-Disposition` header.
pub fn extract_filename(headers: &Headers) -> Option<String> {
    let disposition = headers.get("Content-Disposition")?;
    FILENAME
        .captures(disposition)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename_is_extracted() {
        let headers = Headers::from([(
            "Content-Disposition",
            r#"attachment; filename="report.csv"; size=120"#,
        )]);
        assert_eq!(extract_filename(&headers).as_deref(), Some("report.csv"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let headers = Headers::from([("content-disposition", r#"attachment; FILENAME="data.json";"#)]);
        assert_eq!(extract_filename(&headers).as_deref(), Some("data.json"));
    }

    #[test]
    fn unquoted_or_missing_filenames_are_ignored() {
        let headers = Headers::from([("Content-Disposition", "attachment; filename=plain.txt")]);
        assert_eq!(extract_filename(&headers), None);
        assert_eq!(extract_filename(&Headers::new()), None);
    }
}
