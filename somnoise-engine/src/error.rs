//! Error taxonomy for generation and mastering runs.
//!
//! Every variant is terminal for the current run. Numeric edge cases (silent
//! buffers, zero peaks) are not errors; the level math is epsilon-guarded.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // configuration
    #[error("unknown preset `{0}` (expected one of: brown_noise, fan_noise, rain_window, ocean_waves)")]
    UnknownPreset(String),

    #[error("duration must be a positive, finite number of seconds (got {0})")]
    InvalidDuration(f64),

    #[error("sample rate must be positive (got {0})")]
    InvalidSampleRate(u32),

    #[error("sample rate mismatch: file={file}, expected={expected}")]
    SampleRateMismatch { file: u32, expected: u32 },

    #[error("{}: expected mono 16-bit PCM, found {channels} channel(s) at {bits} bits", .path.display())]
    UnsupportedFormat {
        path: PathBuf,
        channels: u16,
        bits: u16,
    },

    #[error("{name} cutoff {hz} Hz must lie below Nyquist ({nyquist} Hz)")]
    InvalidCutoff {
        name: &'static str,
        hz: f64,
        nyquist: f64,
    },

    #[error("peak ceiling must be a positive, finite linear amplitude (got {0})")]
    InvalidCeiling(f64),

    // i/o
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
