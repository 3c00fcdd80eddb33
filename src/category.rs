use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::catalog::TagStore;
use crate::escape::{self, EscapeError};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no catalog record for played file {path:?}")]
    MissingTags { path: String },
    #[error(transparent)]
    Escape(#[from] EscapeError),
}

// Alternate-version markers: "(Live)", "[Remastered]", ...
static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

// Track numbers and duration variants tacked onto the end of a title.
static TRAILING_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\d+$").unwrap());

// Dance names that legitimately contain digit-like endings; trailing-digit
// removal must not touch titles mentioning them.
const PROTECTED_NAMES: &[&str] = &["Passu", "Lisu"];

fn strip_parenthesized(s: &str) -> String {
    PAREN_RE.replace_all(s, "").into_owned()
}

fn strip_bracketed(s: &str) -> String {
    BRACKET_RE.replace_all(s, "").into_owned()
}

fn strip_trailing_digits(s: &str) -> String {
    if PROTECTED_NAMES.iter().any(|name| s.contains(name)) {
        return s.to_string();
    }
    TRAILING_DIGITS_RE.replace(s, "").into_owned()
}

fn strip_plus(s: &str) -> String {
    s.replace('+', "")
}

/// Capitalize the first letter of every whitespace-separated word. The rest
/// of each word is left untouched; whitespace runs collapse to one space.
fn title_case_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse naming variants of the same dance onto one label.
///
/// The trailing-digit pass runs twice: once over the raw text and once
/// after trimming, so that digits exposed by the trim ("Foo 2 " → "Foo 2")
/// are also removed.
pub fn normalize_title(raw: &str) -> Result<String, EscapeError> {
    let s = strip_parenthesized(raw);
    let s = strip_bracketed(&s);
    let s = strip_trailing_digits(&s);
    let s = strip_plus(&s);
    let s = s.trim().to_string();
    let s = strip_trailing_digits(&s);
    let s = escape::decode(&s)?;
    if s.chars().any(|c| c.is_ascii_uppercase()) {
        Ok(s)
    } else {
        Ok(title_case_words(&s))
    }
}

/// Derive the dance category for a played file.
///
/// A non-empty `User2` tag is the category, verbatim. Otherwise the title
/// (tag, or filename without extension) goes through [`normalize_title`].
/// A path the catalog never described is a data-integrity fault.
pub fn resolve(path: &str, tags: &TagStore) -> Result<String, ResolveError> {
    let attrs = tags.get(path).ok_or_else(|| ResolveError::MissingTags {
        path: path.to_string(),
    })?;

    if let Some(dance) = attrs.get("User2") {
        if !dance.is_empty() {
            return Ok(dance.clone());
        }
    }

    let raw = match attrs.get("Title") {
        Some(title) => title.clone(),
        None => Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
    };

    Ok(normalize_title(&raw)?)
}
