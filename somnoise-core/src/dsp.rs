//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - Levels and gains are computed in `f64`; sample buffers stay `f32`.
//! - Logarithms are epsilon-guarded: silence maps to a very negative dB value,
//!   never to `-inf` or NaN.

#![allow(clippy::excessive_precision)]

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // libm (C math) in no_std
    if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sqrt(x: f64) -> f64 { libm::sqrt(x) }
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { libm::exp(x) }
        #[inline] pub(crate) fn m_log10(x: f64) -> f64 { libm::log10(x) }
        #[inline] pub(crate) fn m_tan(x: f64) -> f64 { libm::tan(x) }
        #[inline] pub(crate) fn m_sin(x: f64) -> f64 { libm::sin(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_sqrt(x: f64) -> f64 { x.sqrt() }
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { x.exp() }
        #[inline] pub(crate) fn m_log10(x: f64) -> f64 { x.log10() }
        #[inline] pub(crate) fn m_tan(x: f64) -> f64 { x.tan() }
        #[inline] pub(crate) fn m_sin(x: f64) -> f64 { x.sin() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f64 = core::f64::consts::TAU;

/// Guard added before taking a logarithm of a level (RMS or peak).
pub const EPS_LOG: f64 = 1.0e-12;

/// Fixed −6 dB output trim shared by the noise presets: 10^(−6/20).
pub const GAIN_MINUS_6DB: f32 = 0.501_187_233_627_272_3;

// --------------------------------- dB / linear -----------------------------------

/// Convert dB to linear gain: lin = 10^(db/20).
#[inline]
pub fn db_to_lin(db: f64) -> f64 {
    m_exp(0.115_129_254_649_702_28 * db) // ln(10)/20
}

/// Convert a non-negative linear level to dB: `20*log10(lin + EPS_LOG)`.
#[inline]
pub fn lin_to_db(lin: f64) -> f64 {
    20.0 * m_log10(lin + EPS_LOG)
}

/// Bilinear-transform prewarp `K = tan(π fc / sr)`.
///
/// Feeding `K` into the analog prototype gives a digital filter whose cutoff
/// lands exactly on `fc`.
#[inline]
pub fn bilinear_k(cut_hz: f64, sr: f64) -> f64 {
    m_tan(core::f64::consts::PI * (cut_hz / sr))
}

/// Sine through the selected math backend.
#[inline]
pub fn sin(x: f64) -> f64 {
    m_sin(x)
}

/// Exponential through the selected math backend.
#[inline]
pub fn exp(x: f64) -> f64 {
    m_exp(x)
}

// --------------------------------- Meters ----------------------------------------

/// Root-mean-square level of `x`, accumulated in `f64`. Empty input → 0.
#[inline]
pub fn rms(x: &[f32]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = x.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    m_sqrt(sum_sq / x.len() as f64)
}

/// RMS level in dBFS: `20*log10(rms + EPS_LOG)`.
#[inline]
pub fn rms_db(x: &[f32]) -> f64 {
    lin_to_db(rms(x))
}

/// Largest absolute sample value. Empty input → 0.
#[inline]
pub fn peak(x: &[f32]) -> f32 {
    x.iter()
        .map(|&s| if s < 0.0 { -s } else { s })
        .fold(0.0_f32, f32::max)
}

/// Arithmetic mean, accumulated in `f64`. Empty input → 0.
#[inline]
pub fn mean(x: &[f32]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|&s| f64::from(s)).sum::<f64>() / x.len() as f64
}

// --------------------------------- Gain / clip -----------------------------------

/// In-place gain: `x[i] *= gain` (computed in f64, stored back as f32).
#[inline]
pub fn scale_in_place(x: &mut [f32], gain: f64) {
    for s in x.iter_mut() {
        *s = (f64::from(*s) * gain) as f32;
    }
}

/// Hard clip every sample into [-1, 1]. Returns how many samples were out of range.
#[inline]
pub fn hard_clip_in_place(x: &mut [f32]) -> usize {
    let mut clipped = 0;
    for s in x.iter_mut() {
        if *s > 1.0 || *s < -1.0 {
            clipped += 1;
            *s = s.clamp(-1.0, 1.0);
        }
    }
    clipped
}

// --------------------------------- Tests (std only) ------------------------------
