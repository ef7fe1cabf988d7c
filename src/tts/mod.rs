//! SSML to WAV: normalize, split, synthesize part by part.

pub mod normalize;
pub mod runner;
pub mod split;
pub mod synthesizer;
