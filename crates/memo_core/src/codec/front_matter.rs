//! Front-matter record codec.
//!
//! # Responsibility
//! - Encode one memo as a `---` delimited metadata block followed by the body.
//! - Decode such text back into a memo, reporting failures as values.
//!
//! # Invariants
//! - `decode(encode(m)) == m` for every memo with a storage-safe id.
//! - The body is written and read verbatim, without escaping.
//! - Decode never panics; unknown metadata lines are ignored.

use crate::model::memo::Memo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DELIMITER: &str = "---";

static FRONT_MATTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---(?:\r?\n(.*))?\z").expect("valid front matter regex")
});
static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^id:[ \t]*"([^"\r\n]+)"[ \t]*\r?$"#).expect("valid id regex"));
static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^title:[ \t]*"((?:[^"\\\r\n]|\\[^\r\n])*)"[ \t]*\r?$"#)
        .expect("valid title regex")
});
static CREATED_AT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^createdAt:[ \t]*(-?\d+)[ \t]*\r?$").expect("valid createdAt regex")
});
static UPDATED_AT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^updatedAt:[ \t]*(-?\d+)[ \t]*\r?$").expect("valid updatedAt regex")
});
static ORDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^order:[ \t]*(\d+)[ \t]*\r?$").expect("valid order regex"));

/// Why a record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeReason {
    /// Text does not start with a `---` delimited metadata block.
    MissingDelimiters,
    /// Required metadata key is absent or malformed.
    MissingField(&'static str),
    /// Numeric metadata value does not fit the expected integer type.
    InvalidNumber { field: &'static str, value: String },
}

/// Recoverable decode failure for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Storage name of the record (file name or blob key).
    pub source_name: String,
    pub reason: DecodeReason,
}

impl Display for DecodeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            DecodeReason::MissingDelimiters => {
                write!(f, "record `{}` has no front matter block", self.source_name)
            }
            DecodeReason::MissingField(field) => write!(
                f,
                "record `{}` is missing field `{field}`",
                self.source_name
            ),
            DecodeReason::InvalidNumber { field, value } => write!(
                f,
                "record `{}` has invalid `{field}` value `{value}`",
                self.source_name
            ),
        }
    }
}

impl Error for DecodeFailure {}

/// Encodes one memo into its persisted text form.
pub fn encode(memo: &Memo) -> String {
    format!(
        "{DELIMITER}\nid: \"{}\"\ntitle: \"{}\"\ncreatedAt: {}\nupdatedAt: {}\norder: {}\n{DELIMITER}\n{}",
        memo.id,
        escape_title(&memo.title),
        memo.created_at,
        memo.updated_at,
        memo.order,
        memo.body
    )
}

/// Decodes one persisted record, returning `None` when it is unusable.
pub fn decode(text: &str, source_name: &str) -> Option<Memo> {
    try_decode(text, source_name).ok()
}

/// Decodes one persisted record and reports why it failed.
pub fn try_decode(text: &str, source_name: &str) -> Result<Memo, DecodeFailure> {
    let failure = |reason| DecodeFailure {
        source_name: source_name.to_string(),
        reason,
    };

    let caps = FRONT_MATTER_RE
        .captures(text)
        .ok_or_else(|| failure(DecodeReason::MissingDelimiters))?;
    let meta = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let id = capture_field(&ID_RE, meta).ok_or_else(|| failure(DecodeReason::MissingField("id")))?;
    let raw_title =
        capture_field(&TITLE_RE, meta).ok_or_else(|| failure(DecodeReason::MissingField("title")))?;
    let created_at = parse_number::<i64>(&CREATED_AT_RE, meta, "createdAt").map_err(failure)?;
    let updated_at = parse_number::<i64>(&UPDATED_AT_RE, meta, "updatedAt").map_err(failure)?;
    let order = parse_number::<u32>(&ORDER_RE, meta, "order").map_err(failure)?;

    Ok(Memo {
        id: id.to_string(),
        title: unescape_title(raw_title),
        body: body.to_string(),
        created_at,
        updated_at,
        order,
    })
}

fn capture_field<'t>(re: &Regex, meta: &'t str) -> Option<&'t str> {
    re.captures(meta)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_number<T: std::str::FromStr>(
    re: &Regex,
    meta: &str,
    field: &'static str,
) -> Result<T, DecodeReason> {
    let raw = capture_field(re, meta).ok_or(DecodeReason::MissingField(field))?;
    raw.parse::<T>().map_err(|_| DecodeReason::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Escapes a title for a single quoted metadata line.
///
/// Backslash is escaped before quote and newline so the added backslashes are
/// not escaped again.
pub fn escape_title(title: &str) -> String {
    title
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Exact inverse of [`escape_title`].
///
/// Works in one left-to-right pass: each escape sequence is consumed once, so
/// an escaped backslash followed by `n` never turns into a newline.
pub fn unescape_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, escape_title, try_decode, unescape_title, DecodeReason};
    use crate::model::memo::Memo;

    fn sample() -> Memo {
        Memo {
            id: "0b7d1d4e-3f43-4a57-9c1e-5b1f0e1a2c3d".to_string(),
            title: "Groceries".to_string(),
            body: "milk\neggs".to_string(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_500,
            order: 2,
        }
    }

    #[test]
    fn encode_uses_fixed_layout() {
        let text = encode(&sample());
        assert_eq!(
            text,
            "---\nid: \"0b7d1d4e-3f43-4a57-9c1e-5b1f0e1a2c3d\"\ntitle: \"Groceries\"\ncreatedAt: 1700000000000\nupdatedAt: 1700000000500\norder: 2\n---\nmilk\neggs"
        );
    }

    #[test]
    fn escape_then_unescape_is_identity_for_tricky_titles() {
        for title in [
            "",
            "plain",
            "quote \" inside",
            "back\\slash",
            "literal \\n not newline",
            "real\nnewline",
            "\\\"",
            "trailing\\",
            "crlf\r\nline",
            "絵文字 🎉 \"引用\"",
        ] {
            assert_eq!(unescape_title(&escape_title(title)), title, "title {title:?}");
        }
    }

    #[test]
    fn decode_round_trips_special_titles_and_bodies() {
        let mut memo = sample();
        memo.title = "say \"hi\"\\ then\nnew line".to_string();
        memo.body = "---\nnot a delimiter issue\n\"quoted\" \\ body\n".to_string();
        let decoded = decode(&encode(&memo), "x.md").expect("memo should decode");
        assert_eq!(decoded, memo);
    }

    #[test]
    fn decode_accepts_empty_title_and_body() {
        let mut memo = sample();
        memo.title.clear();
        memo.body.clear();
        let text = encode(&memo);
        assert!(text.ends_with("---\n"));
        assert_eq!(decode(&text, "x.md"), Some(memo.clone()));

        let without_trailing_newline = text.trim_end_matches('\n');
        assert_eq!(decode(without_trailing_newline, "x.md"), Some(memo));
    }

    #[test]
    fn decode_ignores_unknown_metadata_lines() {
        let text = "---\nid: \"m1\"\ntags: [a, b]\ntitle: \"T\"\ncreatedAt: 1\nupdatedAt: 2\norder: 0\npinned: true\n---\nbody";
        let memo = decode(text, "m1.md").expect("memo should decode");
        assert_eq!(memo.id, "m1");
        assert_eq!(memo.title, "T");
        assert_eq!(memo.body, "body");
    }

    #[test]
    fn decode_tolerates_crlf_delimiters() {
        let text = "---\r\nid: \"m1\"\r\ntitle: \"T\"\r\ncreatedAt: 1\r\nupdatedAt: 2\r\norder: 0\r\n---\r\nbody";
        let memo = decode(text, "m1.md").expect("memo should decode");
        assert_eq!(memo.title, "T");
        assert_eq!(memo.order, 0);
        assert_eq!(memo.body, "body");
    }

    #[test]
    fn decode_reports_missing_delimiters() {
        let err = try_decode("just some text", "loose.md").unwrap_err();
        assert_eq!(err.reason, DecodeReason::MissingDelimiters);
        assert_eq!(err.source_name, "loose.md");
    }

    #[test]
    fn decode_reports_missing_and_invalid_fields() {
        let missing_order = "---\nid: \"m1\"\ntitle: \"T\"\ncreatedAt: 1\nupdatedAt: 2\n---\n";
        assert_eq!(
            try_decode(missing_order, "m1.md").unwrap_err().reason,
            DecodeReason::MissingField("order")
        );

        let textual_order =
            "---\nid: \"m1\"\ntitle: \"T\"\ncreatedAt: 1\nupdatedAt: 2\norder: first\n---\n";
        assert_eq!(
            try_decode(textual_order, "m1.md").unwrap_err().reason,
            DecodeReason::MissingField("order")
        );

        let overflow =
            "---\nid: \"m1\"\ntitle: \"T\"\ncreatedAt: 1\nupdatedAt: 2\norder: 99999999999\n---\n";
        assert!(matches!(
            try_decode(overflow, "m1.md").unwrap_err().reason,
            DecodeReason::InvalidNumber { field: "order", .. }
        ));

        let unquoted_id = "---\nid: m1\ntitle: \"T\"\ncreatedAt: 1\nupdatedAt: 2\norder: 0\n---\n";
        assert_eq!(
            try_decode(unquoted_id, "m1.md").unwrap_err().reason,
            DecodeReason::MissingField("id")
        );
    }
}
