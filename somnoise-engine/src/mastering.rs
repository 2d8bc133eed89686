//! Mastering pipeline: band filtering → fades → loudness normalization.
//!
//! Runs on a fully loaded buffer. The stages are strictly ordered since each
//! consumes the previous one's output.

use std::path::Path;

use somnoise_core::dsp::{db_to_lin, lin_to_db, peak, rms_db, scale_in_place, EPS_LOG};
use somnoise_core::filters::{filtfilt, BiquadCoeffs, FilterKind};
use tracing::{debug, info, warn};

use crate::config::FilterSpec;
use crate::error::Result;
use crate::wav;

/// Outcome of [`normalize_to_rms_db`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normalization {
    /// Gain applied to reach the RMS target, in dB.
    pub gain_db: f64,
    /// Whether the peak ceiling forced a further reduction.
    pub clamped: bool,
}

/// Summary of one mastering pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MasterReport {
    pub frames: usize,
    pub faded: bool,
    pub gain_db: f64,
    pub peak_clamped: bool,
    pub rms_dbfs: f64,
    pub peak_linear: f64,
    pub peak_dbfs: f64,
}

/// Zero-phase 2nd-order Butterworth highpass and/or lowpass, highpass first.
///
/// A stage is skipped when its cutoff is `None` or `<= 0`.
pub fn band_filter(x: &mut [f32], sample_rate: u32, highpass_hz: Option<f64>, lowpass_hz: Option<f64>) {
    let sr = f64::from(sample_rate);
    if let Some(hz) = highpass_hz.filter(|&hz| hz > 0.0) {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Highpass, hz, sr);
        filtfilt(&c, x);
    }
    if let Some(hz) = lowpass_hz.filter(|&hz| hz > 0.0) {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, hz, sr);
        filtfilt(&c, x);
    }
}

/// Linear fade-in and fade-out of `fade_seconds * sr` samples each.
///
/// All or nothing: if both fades do not fit in the buffer, it is left
/// untouched. Returns whether the fades were applied.
pub fn apply_fade(x: &mut [f32], sample_rate: u32, fade_seconds: u32) -> bool {
    let fade_len = u64::from(fade_seconds) * u64::from(sample_rate);
    if fade_len == 0 || fade_len.saturating_mul(2) > x.len() as u64 {
        return false;
    }
    let fade_len = fade_len as usize;
    let start_out = x.len() - fade_len;
    let denom = (fade_len - 1).max(1) as f64;
    for i in 0..fade_len {
        // endpoints included: the first sample is silent, so is the last
        let ramp = if fade_len == 1 { 0.0 } else { i as f64 / denom };
        x[i] = (f64::from(x[i]) * ramp) as f32;
        x[start_out + i] = (f64::from(x[start_out + i]) * (1.0 - ramp).max(0.0)) as f32;
    }
    true
}

/// Scale `x` so its RMS sits at `target_db` dBFS, then pull the whole signal
/// down if its peak would exceed `peak_ceiling_linear`.
///
/// The ceiling wins over the target: a very peaky signal ends up quieter
/// than asked for.
pub fn normalize_to_rms_db(x: &mut [f32], target_db: f64, peak_ceiling_linear: f64) -> Normalization {
    let current_db = rms_db(x);
    let gain_db = target_db - current_db;
    scale_in_place(x, db_to_lin(gain_db));

    let peak = f64::from(peak(x)) + EPS_LOG;
    let clamped = peak > peak_ceiling_linear;
    if clamped {
        scale_in_place(x, peak_ceiling_linear / peak);
    }
    Normalization { gain_db, clamped }
}

/// Run all three stages on an in-memory buffer.
pub fn master_buffer(x: &mut [f32], sample_rate: u32, spec: &FilterSpec) -> Result<MasterReport> {
    spec.validate(sample_rate)?;

    band_filter(x, sample_rate, spec.highpass(), spec.lowpass());
    debug!(highpass = ?spec.highpass(), lowpass = ?spec.lowpass(), "band filter done");

    let faded = apply_fade(x, sample_rate, spec.fade_seconds);
    if !faded && spec.fade_seconds > 0 {
        debug!(fade_seconds = spec.fade_seconds, frames = x.len(), "fades skipped: signal too short");
    }

    let norm = normalize_to_rms_db(x, spec.target_rms_dbfs, spec.peak_ceiling_linear);
    if norm.clamped {
        warn!(
            ceiling = spec.peak_ceiling_linear,
            "peak ceiling engaged; final loudness is below the RMS target"
        );
    }

    let peak_linear = f64::from(peak(x));
    Ok(MasterReport {
        frames: x.len(),
        faded,
        gain_db: norm.gain_db,
        peak_clamped: norm.clamped,
        rms_dbfs: rms_db(x),
        peak_linear,
        peak_dbfs: lin_to_db(peak_linear),
    })
}

/// Read `input` whole, master it and write `output` (16-bit mono).
///
/// The input must already be at `sample_rate`; there is no resampling.
pub fn master_file(input: &Path, output: &Path, sample_rate: u32, spec: &FilterSpec) -> Result<MasterReport> {
    spec.validate(sample_rate)?;
    let mut x = wav::read_mono(input, sample_rate)?;
    info!(input = %input.display(), frames = x.len(), sample_rate, "mastering");

    let report = master_buffer(&mut x, sample_rate, spec)?;
    wav::write_mono(output, sample_rate, &x)?;

    info!(
        output = %output.display(),
        rms_dbfs = report.rms_dbfs,
        peak = report.peak_linear,
        peak_dbfs = report.peak_dbfs,
        "processed audio written"
    );
    Ok(report)
}
