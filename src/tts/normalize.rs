//! Locating the `<speak>` root of an SSML document.
//!
//! Documents exported by editors often carry a byte-order mark, an XML
//! declaration or a comment banner ahead of the root element. Those are
//! stripped explicitly before the root is searched for. The body is returned
//! as a slice of the input, byte for byte.

use crate::error::{Result, SpeechError};
use regex::Regex;
use std::sync::LazyLock;

// SAFETY: hardcoded patterns are always valid
#[allow(clippy::expect_used)]
static XML_PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<\?xml[^>]*\?>\s*").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static LEADING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<!--.*?-->\s*").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static SPEAK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*speak\b[^>]*>").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static SPEAK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)</\s*speak\s*>").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static VOICE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*voice\b").expect("hardcoded regex"));

const BOM: char = '\u{feff}';

/// An SSML document split around its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakDocument<'a> {
    pub open_tag: &'a str,
    pub body: &'a str,
    pub close_tag: &'a str,
}

/// Strip a BOM, a leading `<?xml ...?>` declaration and a leading comment.
pub fn normalize_prolog(text: &str) -> &str {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let text = strip_leading(&XML_PROLOG, text);
    strip_leading(&LEADING_COMMENT, text)
}

fn strip_leading<'a>(pattern: &Regex, text: &'a str) -> &'a str {
    match pattern.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Find the `<speak>` root of `text`.
///
/// Fails with [`SpeechError::MalformedDocument`] when no opening tag is
/// followed by a closing one.
pub fn extract_speak_body(text: &str) -> Result<SpeakDocument<'_>> {
    let text = normalize_prolog(text);

    let open = SPEAK_OPEN.find(text).ok_or_else(missing_root)?;
    let close = SPEAK_CLOSE
        .find_at(text, open.end())
        .ok_or_else(missing_root)?;

    Ok(SpeakDocument {
        open_tag: open.as_str(),
        body: &text[open.end()..close.start()],
        close_tag: close.as_str(),
    })
}

fn missing_root() -> SpeechError {
    SpeechError::MalformedDocument {
        message: "cannot find <speak> ... </speak> root; the document must have a single \
                  <speak> element"
            .to_string(),
    }
}

/// Count `<voice` opening tags anywhere in `text`.
pub fn count_voice_elements(text: &str) -> usize {
    VOICE_OPEN.find_iter(text).count()
}
