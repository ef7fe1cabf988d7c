//! Batch transcription: input discovery, recognition sessions and subtitle
//! output.

pub mod input;
pub mod recognizer;
pub mod segment;
pub mod session;
pub mod subtitle;
