use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum EscapeError {
    #[error("unhandled escape sequence in {text:?}")]
    Unhandled { text: String },
}

// Any remaining &...; run after the known escapes are substituted.
static LEFTOVER_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(.+);").unwrap());

/// Decode the character escapes the catalog uses: `&apos;` and `&amp;`.
///
/// Anything else shaped like an escape left after substitution means the
/// catalog contains text we don't know how to decode; no chart output is
/// trustworthy past that point, so it is an error rather than a pass-through.
pub fn decode(s: &str) -> Result<String, EscapeError> {
    let result = s.replace("&apos;", "'").replace("&amp;", "&");
    if LEFTOVER_ESCAPE_RE.is_match(&result) {
        return Err(EscapeError::Unhandled { text: result });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_identity() {
        assert_eq!(decode("Blue Danube").unwrap(), "Blue Danube");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn apostrophe_escape() {
        assert_eq!(decode("Can&apos;t Stop").unwrap(), "Can't Stop");
    }

    #[test]
    fn ampersand_escape() {
        assert_eq!(decode("Rock &amp; Roll").unwrap(), "Rock & Roll");
    }

    #[test]
    fn both_escapes_in_one_string() {
        assert_eq!(
            decode("Don&apos;t Stop &amp; Go").unwrap(),
            "Don't Stop & Go"
        );
    }

    #[test]
    fn idempotent_on_decoded_text() {
        let once = decode("Can&apos;t Stop").unwrap();
        assert_eq!(decode(&once).unwrap(), once);
    }

    #[test]
    fn unhandled_escape_is_an_error() {
        let err = decode("Caf&eacute; del Mar").unwrap_err();
        assert_eq!(
            err,
            EscapeError::Unhandled {
                text: "Caf&eacute; del Mar".to_string()
            }
        );
    }

    #[test]
    fn unhandled_escape_after_valid_one() {
        assert!(decode("A&apos;s &quot;B&quot;").is_err());
    }
}
