use crate::defaults::TICKS_PER_SECOND;

/// One recognized utterance with its position in the audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
    pub text: String,
}

impl AudioSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Build from an offset and duration in 100ns ticks.
    pub fn from_ticks(offset_ticks: u64, duration_ticks: u64, text: impl Into<String>) -> Self {
        let start = offset_ticks as f64 / TICKS_PER_SECOND;
        let end = start + duration_ticks as f64 / TICKS_PER_SECOND;
        Self::new(start, end, text)
    }
}
