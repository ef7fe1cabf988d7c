//! PCM WAV headers, and writing WAV files sample by sample.

use crate::error::{Result, SpeechError};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

/// The parameters that must agree for two WAV files to be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    pub channel_count: u16,
    /// Bytes per sample.
    pub sample_width: u16,
    pub frame_rate: u32,
}

impl fmt::Display for AudioParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(channels={}, sample_width={}, frame_rate={})",
            self.channel_count, self.sample_width, self.frame_rate
        )
    }
}

impl AudioParams {
    fn from_spec(spec: &hound::WavSpec) -> Self {
        Self {
            channel_count: spec.channels,
            sample_width: spec.bits_per_sample.div_ceil(8),
            frame_rate: spec.sample_rate,
        }
    }

    fn to_spec(self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channel_count,
            sample_rate: self.frame_rate,
            bits_per_sample: self.sample_width * 8,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// An integer PCM WAV file, known by its header.
///
/// Opening reads only the header; sample data stays on disk until it is
/// streamed into a [`WavSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFileHandle {
    pub path: PathBuf,
    pub params: AudioParams,
    /// Interleaved samples across all channels.
    pub sample_count: u32,
}

impl AudioFileHandle {
    /// Read the format parameters and data length of a WAV file.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int {
            return Err(SpeechError::Wav(hound::Error::Unsupported));
        }
        Ok(Self {
            path: path.to_path_buf(),
            params: AudioParams::from_spec(&spec),
            sample_count: reader.len(),
        })
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        match self.params.channel_count {
            0 => 0,
            n => self.sample_count as usize / n as usize,
        }
    }
}

/// A WAV file being written incrementally.
pub struct WavSink<W: Write + Seek> {
    writer: hound::WavWriter<W>,
    params: AudioParams,
}

impl WavSink<BufWriter<fs::File>> {
    /// Create `path`, and its parent directories, for samples in `params`.
    pub fn create(path: &Path, params: AudioParams) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(fs::File::create(path)?), params)
    }
}

impl<W: Write + Seek> WavSink<W> {
    pub fn new(writer: W, params: AudioParams) -> Result<Self> {
        Ok(Self {
            writer: hound::WavWriter::new(writer, params.to_spec())?,
            params,
        })
    }

    pub fn write_samples(&mut self, samples: &[i32]) -> Result<()> {
        for &sample in samples {
            self.write_sample(sample)?;
        }
        Ok(())
    }

    /// Copy the sample data of `handle` one sample at a time.
    pub fn append(&mut self, handle: &AudioFileHandle) -> Result<()> {
        let mut reader = hound::WavReader::open(&handle.path)?;
        for sample in reader.samples::<i32>() {
            self.write_sample(sample?)?;
        }
        Ok(())
    }

    /// Patch the header lengths and flush.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }

    fn write_sample(&mut self, sample: i32) -> Result<()> {
        match self.params.sample_width {
            1 => self.writer.write_sample(sample as i8)?,
            2 => self.writer.write_sample(sample as i16)?,
            _ => self.writer.write_sample(sample)?,
        }
        Ok(())
    }
}

/// Write interleaved samples with the given parameters to `path`,
/// creating parent directories as needed.
pub fn write_wav<'a>(
    path: &Path,
    params: AudioParams,
    chunks: impl IntoIterator<Item = &'a [i32]>,
) -> Result<()> {
    let mut sink = WavSink::create(path, params)?;
    for chunk in chunks {
        sink.write_samples(chunk)?;
    }
    sink.finalize()
}
