pub mod concat;
pub mod transcode;
pub mod wav;
