//! Streaming block driver.
//!
//! The driver owns the run's only `SynthesisState` and its seeded generator,
//! pulls fixed-size blocks from the preset in strict order, hard-clips them and
//! hands them to a sink. At most one block is alive at a time, which is what
//! lets an eight-hour track be rendered in a few hundred kilobytes of memory.

use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use somnoise_core::dsp::hard_clip_in_place;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::presets::{SynthesisState, Synthesizer};
use crate::wav::WavSink;

/// Frames requested from the preset per block (the last block may be shorter).
pub const BLOCK_FRAMES: usize = 65_536;

/// Destination for clipped blocks.
pub trait SampleSink {
    fn write_block(&mut self, block: &[f32]) -> Result<()>;
}

/// In-memory sink, handy for tests and short renders.
impl SampleSink for Vec<f32> {
    fn write_block(&mut self, block: &[f32]) -> Result<()> {
        self.extend_from_slice(block);
        Ok(())
    }
}

/// What a finished (or partially drained) run produced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub frames: u64,
    pub blocks: u64,
    /// Samples the safety clip had to pull back into [-1, 1].
    pub clipped_samples: u64,
}

/// Pulls blocks from a preset until the configured duration is reached.
pub struct BlockDriver<R = StdRng> {
    state: SynthesisState,
    rng: R,
    block_frames: usize,
    remaining: u64,
    report: RenderReport,
}

impl BlockDriver<StdRng> {
    /// Validate `config` and set up its state and generator.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Self::with_rng(config, config.rng())
    }
}

impl<R: Rng> BlockDriver<R> {
    pub fn with_rng(config: &GenerationConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let state = SynthesisState::new(config.preset, config.sample_rate, &mut rng);
        Ok(Self {
            state,
            rng,
            block_frames: BLOCK_FRAMES,
            remaining: config.total_frames(),
            report: RenderReport::default(),
        })
    }

    /// Override the block size (clamped to at least one frame).
    #[must_use]
    pub fn with_block_frames(mut self, frames: usize) -> Self {
        self.block_frames = frames.max(1);
        self
    }

    #[inline] pub fn remaining_frames(&self) -> u64 { self.remaining }
    #[inline] pub fn report(&self) -> RenderReport { self.report }
    #[inline] pub fn state(&self) -> &SynthesisState { &self.state }

    /// Render, clip and account for the next block; `None` once the run is complete.
    pub fn next_block(&mut self) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.remaining.min(self.block_frames as u64) as usize;
        let mut block = self.state.render(n, &mut self.rng);

        let clipped = hard_clip_in_place(&mut block);
        if clipped > 0 {
            warn!(
                block = self.report.blocks,
                clipped,
                "samples outside [-1, 1] before the safety clip"
            );
        }
        debug!(block = self.report.blocks, frames = n, "rendered block");

        self.remaining -= n as u64;
        self.report.frames += n as u64;
        self.report.blocks += 1;
        self.report.clipped_samples += clipped as u64;
        Some(block)
    }

    /// Drain the run into `sink`, one block at a time.
    pub fn run<S: SampleSink + ?Sized>(mut self, sink: &mut S) -> Result<RenderReport> {
        while let Some(block) = self.next_block() {
            sink.write_block(&block)?;
        }
        Ok(self.report)
    }
}

impl<R: Rng> Iterator for BlockDriver<R> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block()
    }
}

/// Synthesize `config` straight into a 16-bit mono WAV at `path`.
///
/// The configuration is validated before the file is created.
pub fn generate_to_file(config: &GenerationConfig, path: &Path) -> Result<RenderReport> {
    let driver = BlockDriver::new(config)?;
    info!(
        preset = %config.preset,
        seconds = config.duration_seconds,
        sample_rate = config.sample_rate,
        frames = driver.remaining_frames(),
        seed = ?config.seed,
        path = %path.display(),
        "generating raw audio"
    );

    let mut sink = WavSink::create(path, config.sample_rate)?;
    let report = driver.run(&mut sink)?;
    sink.finalize()?;

    info!(
        frames = report.frames,
        blocks = report.blocks,
        clipped = report.clipped_samples,
        "raw audio written"
    );
    Ok(report)
}
