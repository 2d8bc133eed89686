//! Mono 16-bit PCM WAV sinks and sources (via `hound`).
//!
//! Conversion follows the usual full-scale convention: writing scales by
//! 32767 and rounds, reading divides by 32768.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::driver::SampleSink;
use crate::error::{Error, Result};

pub const BITS_PER_SAMPLE: u16 = 16;

/// WAV header for a mono 16-bit integer stream at `sample_rate`.
pub fn pcm16_mono(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

#[inline]
pub fn to_pcm16(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[inline]
pub fn from_pcm16(s: i16) -> f32 {
    f32::from(s) / 32768.0
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Incremental WAV writer; stays open for the whole run.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WavSink {
    /// Create (or truncate) `path`, making parent directories as needed.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        ensure_parent(path)?;
        let writer = WavWriter::create(path, pcm16_mono(sample_rate))?;
        Ok(Self { writer, frames: 0 })
    }

    #[inline] pub fn frames(&self) -> u64 { self.frames }

    /// Patch the header lengths and flush.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl SampleSink for WavSink {
    fn write_block(&mut self, block: &[f32]) -> Result<()> {
        for &s in block {
            self.writer.write_sample(to_pcm16(s))?;
        }
        self.frames += block.len() as u64;
        Ok(())
    }
}

/// Write a whole buffer as a mono 16-bit file.
pub fn write_mono(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let mut sink = WavSink::create(path, sample_rate)?;
    sink.write_block(samples)?;
    sink.finalize()
}

/// Open `path` and check it is mono 16-bit integer PCM.
pub(crate) fn open_pcm16(path: &Path) -> Result<WavReader<std::io::BufReader<File>>> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1
        || spec.bits_per_sample != BITS_PER_SAMPLE
        || spec.sample_format != SampleFormat::Int
    {
        return Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            channels: spec.channels,
            bits: spec.bits_per_sample,
        });
    }
    Ok(reader)
}

/// Read a whole mono file, insisting on `expected_sample_rate`. No resampling.
pub fn read_mono(path: &Path, expected_sample_rate: u32) -> Result<Vec<f32>> {
    let mut reader = open_pcm16(path)?;
    let file_sr = reader.spec().sample_rate;
    if file_sr != expected_sample_rate {
        return Err(Error::SampleRateMismatch {
            file: file_sr,
            expected: expected_sample_rate,
        });
    }
    reader
        .samples::<i16>()
        .map(|s| s.map(from_pcm16).map_err(Error::from))
        .collect()
}
