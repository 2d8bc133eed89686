//! Streaming level measurement of finished files.
//!
//! Reads in driver-sized blocks so multi-hour tracks never have to be loaded
//! whole just to be checked.

use std::path::Path;

use somnoise_core::dsp::{lin_to_db, peak};

use crate::driver::BLOCK_FRAMES;
use crate::error::Result;
use crate::wav;

/// Level and length of a mono signal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Metrics {
    pub frames: u64,
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub peak_linear: f64,
    pub peak_dbfs: f64,
    /// `-inf` for an empty signal.
    pub rms_dbfs: f64,
}

/// Running peak and sum of squares, fed block by block.
#[derive(Copy, Clone, Debug, Default)]
pub struct LevelMeter {
    peak: f32,
    sum_sq: f64,
    count: u64,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: &[f32]) {
        self.peak = self.peak.max(peak(block));
        self.sum_sq += block.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>();
        self.count += block.len() as u64;
    }

    pub fn finish(&self, sample_rate: u32) -> Metrics {
        let peak_linear = f64::from(self.peak);
        let rms_dbfs = if self.count == 0 {
            f64::NEG_INFINITY
        } else {
            lin_to_db((self.sum_sq / self.count as f64).sqrt())
        };
        Metrics {
            frames: self.count,
            sample_rate,
            duration_seconds: if sample_rate == 0 {
                0.0
            } else {
                self.count as f64 / f64::from(sample_rate)
            },
            peak_linear,
            peak_dbfs: lin_to_db(peak_linear),
            rms_dbfs,
        }
    }
}

/// Metrics of an in-memory buffer.
pub fn measure(samples: &[f32], sample_rate: u32) -> Metrics {
    let mut meter = LevelMeter::new();
    meter.push(samples);
    meter.finish(sample_rate)
}

/// Metrics of a mono 16-bit WAV, streamed in [`BLOCK_FRAMES`]-sized reads.
pub fn measure_file(path: &Path) -> Result<Metrics> {
    let mut reader = wav::open_pcm16(path)?;
    let sample_rate = reader.spec().sample_rate;

    let mut meter = LevelMeter::new();
    let mut block = Vec::with_capacity(BLOCK_FRAMES);
    for s in reader.samples::<i16>() {
        block.push(wav::from_pcm16(s?));
        if block.len() == BLOCK_FRAMES {
            meter.push(&block);
            block.clear();
        }
    }
    meter.push(&block);
    Ok(meter.finish(sample_rate))
}
