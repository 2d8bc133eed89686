//! somnoise engine: presets, streaming driver and mastering.
//!
//! Crate layout:
//! - [`config`]    : `Preset`, `GenerationConfig`, `FilterSpec`
//! - [`nodes`]     : random walk, swell LFO, droplet scheduler
//! - [`presets`]   : `Synthesizer` trait and the per-preset `SynthesisState`
//! - [`driver`]    : block driver and raw-file generation
//! - [`mastering`] : zero-phase band filter, fades, RMS normalization
//! - [`metrics`]   : streaming peak / RMS measurement
//! - [`wav`]       : mono 16-bit PCM I/O
//! - [`error`]     : error taxonomy
//!
//! Everything is single-threaded and synchronous. A run owns exactly one
//! state record and one seeded generator, both threaded through the driver.

pub mod config;
pub mod driver;
pub mod error;
pub mod mastering;
pub mod metrics;
pub mod nodes;
pub mod presets;
pub mod wav;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use config::{FilterSpec, GenerationConfig, Preset, DEFAULT_SAMPLE_RATE};
pub use driver::{generate_to_file, BlockDriver, RenderReport, SampleSink, BLOCK_FRAMES};
pub use error::{Error, Result};
pub use mastering::{master_buffer, master_file, MasterReport};
pub use metrics::{measure, measure_file, Metrics};
pub use presets::{SynthesisState, Synthesizer};
