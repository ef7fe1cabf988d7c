//! Splitting an SSML document into parts with a bounded number of
//! `<voice>` elements.

use crate::error::{Result, SpeechError};
use crate::tts::normalize::{SpeakDocument, extract_speak_body};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

// SAFETY: hardcoded pattern is always valid
#[allow(clippy::expect_used)]
static VOICE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*voice\b[^>]*>.*?<\s*/\s*voice\s*>").expect("hardcoded regex")
});

/// A standalone SSML document holding a run of consecutive voice blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupChunk<'a> {
    open_tag: &'a str,
    blocks: Vec<&'a str>,
    close_tag: &'a str,
}

impl<'a> MarkupChunk<'a> {
    /// The voice blocks in this chunk, in document order.
    pub fn blocks(&self) -> &[&'a str] {
        &self.blocks
    }

    /// Render as `open + "\n" + blocks joined by "\n" + "\n" + close`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MarkupChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.open_tag)?;
        writeln!(f, "{}", self.blocks.join("\n"))?;
        write!(f, "{}", self.close_tag)
    }
}

/// All top-level `<voice>...</voice>` blocks of `body`, in order.
///
/// Matching is non-greedy, so each block ends at the first closing tag.
pub fn extract_voice_blocks(body: &str) -> Vec<&str> {
    VOICE_BLOCK.find_iter(body).map(|m| m.as_str()).collect()
}

/// Group the voice blocks of `doc` into chunks of at most `max_voices`.
///
/// A body without any voice block becomes a single chunk holding the raw body.
pub fn split_by_voice<'a>(doc: &SpeakDocument<'a>, max_voices: usize) -> Result<Vec<MarkupChunk<'a>>> {
    if max_voices == 0 {
        return Err(SpeechError::ConfigInvalidValue {
            key: "max_voices".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    let mut blocks = extract_voice_blocks(doc.body);
    if blocks.is_empty() {
        blocks.push(doc.body);
    }

    Ok(blocks
        .chunks(max_voices)
        .map(|run| MarkupChunk {
            open_tag: doc.open_tag,
            blocks: run.to_vec(),
            close_tag: doc.close_tag,
        })
        .collect())
}

/// Normalize, split and render `ssml` into standalone part documents.
pub fn split_ssml(ssml: &str, max_voices: usize) -> Result<Vec<String>> {
    let doc = extract_speak_body(ssml)?;
    let chunks = split_by_voice(&doc, max_voices)?;
    tracing::debug!(
        chunks = chunks.len(),
        max_voices,
        "split SSML document"
    );
    Ok(chunks.iter().map(MarkupChunk::render).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(voices: usize) -> String {
        let mut body = String::new();
        for i in 0..voices {
            body.push_str(&format!(
                "\n  <voice name=\"en-US-JennyNeural\"><prosody rate=\"-5%\">Line {i}.</prosody></voice>"
            ));
        }
        format!("<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\">{body}\n</speak>")
    }

    #[test]
    fn chunk_count_is_ceiling_of_voice_count() {
        for (voices, max) in [(1, 48), (48, 48), (49, 48), (100, 48), (7, 3), (9, 3), (5, 1)] {
            let text = document(voices);
            let doc = extract_speak_body(&text).unwrap();
            let chunks = split_by_voice(&doc, max).unwrap();
            assert_eq!(chunks.len(), voices.div_ceil(max), "voices={voices} max={max}");
            assert!(chunks.iter().all(|c| c.blocks().len() <= max));
        }
    }

    #[test]
    fn chunks_reconstruct_original_sequence() {
        let text = document(10);
        let doc = extract_speak_body(&text).unwrap();
        let original = extract_voice_blocks(doc.body);

        let chunks = split_by_voice(&doc, 4).unwrap();
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.blocks().iter().copied()).collect();
        assert_eq!(rejoined, original);
        assert_eq!(
            chunks.iter().map(|c| c.blocks().len()).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
    }

    #[test]
    fn rendered_parts_are_standalone_documents() {
        let text = document(5);
        let parts = split_ssml(&text, 2).unwrap();
        assert_eq!(parts.len(), 3);

        let mut rejoined = Vec::new();
        for part in &parts {
            let doc = extract_speak_body(part).unwrap();
            assert!(doc.open_tag.starts_with("<speak version=\"1.0\""));
            assert_eq!(doc.close_tag, "</speak>");
            rejoined.extend(extract_voice_blocks(doc.body).into_iter().map(str::to_string));
        }

        let original_doc = extract_speak_body(&text).unwrap();
        let original: Vec<String> = extract_voice_blocks(original_doc.body)
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn render_layout_matches_join_format() {
        let text = "<speak><voice name=\"a\">A</voice> <voice name=\"b\">B</voice></speak>";
        let parts = split_ssml(text, 48).unwrap();
        assert_eq!(
            parts,
            vec!["<speak>\n<voice name=\"a\">A</voice>\n<voice name=\"b\">B</voice>\n</speak>".to_string()]
        );
    }

    #[test]
    fn body_without_voice_is_one_chunk() {
        let text = "<speak xml:lang=\"en-US\">  Just text. </speak>";
        let doc = extract_speak_body(text).unwrap();
        let chunks = split_by_voice(&doc, 48).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].blocks(), &["  Just text. "]);
        assert_eq!(
            chunks[0].render(),
            "<speak xml:lang=\"en-US\">\n  Just text. \n</speak>"
        );
    }

    #[test]
    fn voice_matching_is_non_greedy() {
        let body = "<voice name=\"a\">one</voice><break/><voice name=\"b\">two</voice>";
        assert_eq!(
            extract_voice_blocks(body),
            vec!["<voice name=\"a\">one</voice>", "<voice name=\"b\">two</voice>"]
        );
    }

    #[test]
    fn voice_blocks_span_lines() {
        let body = "<voice name=\"a\">\n  line one\n  line two\n</ voice >";
        assert_eq!(extract_voice_blocks(body), vec![body]);
    }

    #[test]
    fn prologue_does_not_change_split() {
        let plain = document(7);
        let decorated = format!("\u{feff}<?xml version=\"1.0\"?>\n<!-- banner -->\n{plain}");
        assert_eq!(split_ssml(&plain, 3).unwrap(), split_ssml(&decorated, 3).unwrap());
    }

    #[test]
    fn zero_max_voices_is_rejected() {
        let text = document(2);
        let result = split_ssml(&text, 0);
        assert!(matches!(result, Err(SpeechError::ConfigInvalidValue { .. })));
    }

    #[test]
    fn malformed_document_propagates() {
        let result = split_ssml("<speak><voice>never closed</voice>", 48);
        assert!(matches!(result, Err(SpeechError::MalformedDocument { .. })));
    }
}
