//! Filters: 2nd-order Butterworth biquads and zero-phase (forward-backward) filtering.
//!
//! Contents
//! - `FilterKind`   : low-pass / high-pass response selection
//! - `BiquadCoeffs` : normalized coefficients (a0 = 1), Butterworth design via bilinear transform
//! - `Biquad`       : Direct Form II Transposed section, generic over `num_traits::Float`
//! - `filtfilt`     : whole-buffer forward-backward pass with odd-extension edges
//!
//! Notes
//! - Coefficients are designed in `f64` from the prewarped `K = tan(π fc / sr)`,
//!   so the −3 dB point of a single pass lands exactly on `fc`.
//! - `filtfilt` squares the magnitude response and cancels the phase response;
//!   the combined cutoff sits at −6 dB.

use crate::dsp::bilinear_k;
use core::f64::consts::SQRT_2;
use num_traits::Float;

/// Samples of odd extension added at each edge by [`filtfilt`]: 3 × (order + 1).
pub const PAD_LEN: usize = 9;

/// Response of a Butterworth section.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

/// Biquad coefficients, normalized so that `a0 == 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BiquadCoeffs<T> {
    pub b0: T,
    pub b1: T,
    pub b2: T,
    pub a1: T,
    pub a2: T,
}

impl<T: Float> BiquadCoeffs<T> {
    /// 2nd-order Butterworth design (Q = 1/√2) at `cut_hz` for sample rate `sr`.
    ///
    /// `cut_hz` must lie strictly between 0 and `sr / 2`; callers validate this.
    pub fn butterworth(kind: FilterKind, cut_hz: f64, sr: f64) -> Self {
        let k = bilinear_k(cut_hz, sr);
        let k2 = k * k;
        let norm = 1.0 / (1.0 + SQRT_2 * k + k2);
        let a1 = 2.0 * (k2 - 1.0) * norm;
        let a2 = (1.0 - SQRT_2 * k + k2) * norm;
        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => (k2 * norm, 2.0 * k2 * norm, k2 * norm),
            FilterKind::Highpass => (norm, -2.0 * norm, norm),
        };
        Self {
            b0: cast(b0),
            b1: cast(b1),
            b2: cast(b2),
            a1: cast(a1),
            a2: cast(a2),
        }
    }

    /// Gain at 0 Hz: `Σb / Σa`.
    #[inline]
    pub fn dc_gain(&self) -> T {
        (self.b0 + self.b1 + self.b2) / (T::one() + self.a1 + self.a2)
    }

    /// Internal state `(z1, z2)` a DF2T section holds after settling on a unit step.
    ///
    /// Scaling it by the first input sample starts the filter as if that value
    /// had been present forever, which removes the start-up transient.
    #[inline]
    pub fn steady_state(&self) -> (T, T) {
        let g = self.dc_gain();
        let z2 = self.b2 - self.a2 * g;
        let z1 = self.b1 - self.a1 * g + z2;
        (z1, z2)
    }
}

#[inline]
fn cast<T: Float>(v: f64) -> T {
    num_traits::cast(v).unwrap_or_else(T::zero)
}

/// Direct Form II Transposed biquad section.
#[derive(Copy, Clone, Debug)]
pub struct Biquad<T> {
    c: BiquadCoeffs<T>,
    z1: T,
    z2: T,
}

impl<T: Float> Biquad<T> {
    #[inline]
    pub fn new(c: BiquadCoeffs<T>) -> Self {
        Self { c, z1: T::zero(), z2: T::zero() }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.z1 = T::zero();
        self.z2 = T::zero();
    }

    /// Load the steady-state for a constant input `x0`.
    #[inline]
    pub fn prime(&mut self, x0: T) {
        let (z1, z2) = self.c.steady_state();
        self.z1 = z1 * x0;
        self.z2 = z2 * x0;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, x: T) -> T {
        let y = self.c.b0 * x + self.z1;
        self.z1 = self.c.b1 * x - self.c.a1 * y + self.z2;
        self.z2 = self.c.b2 * x - self.c.a2 * y;
        y
    }
}

/// Zero-phase filtering of a whole buffer, in place.
///
/// The signal is extended at each end by up to [`PAD_LEN`] samples of odd
/// reflection about the edge value, run forward from a primed state, then run
/// backward from a state primed on the last forward output. The extension is
/// generated on the fly; only the right-hand forward outputs are kept, since
/// the backward pass needs them and discards everything left of the signal.
pub fn filtfilt(coeffs: &BiquadCoeffs<f64>, x: &mut [f32]) {
    let n = x.len();
    if n == 0 {
        return;
    }
    let pad = PAD_LEN.min(n - 1);
    let first = f64::from(x[0]);
    let last = f64::from(x[n - 1]);

    let mut left_pad = [0.0_f64; PAD_LEN];
    let mut right_pad = [0.0_f64; PAD_LEN];
    for i in 0..pad {
        left_pad[i] = 2.0 * first - f64::from(x[pad - i]);
        right_pad[i] = 2.0 * last - f64::from(x[n - 2 - i]);
    }

    // forward
    let mut fwd = Biquad::new(*coeffs);
    fwd.prime(if pad > 0 { left_pad[0] } else { first });
    for &v in &left_pad[..pad] {
        fwd.process(v);
    }
    for s in x.iter_mut() {
        *s = fwd.process(f64::from(*s)) as f32;
    }
    let mut right_out = [0.0_f64; PAD_LEN];
    for (out, &v) in right_out.iter_mut().zip(&right_pad[..pad]) {
        *out = fwd.process(v);
    }

    // backward
    let mut bwd = Biquad::new(*coeffs);
    bwd.prime(if pad > 0 { right_out[pad - 1] } else { f64::from(x[n - 1]) });
    for &v in right_out[..pad].iter().rev() {
        bwd.process(v);
    }
    for s in x.iter_mut().rev() {
        *s = bwd.process(f64::from(*s)) as f32;
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::TAU;
    use alloc::vec::Vec;

    #[test]
    fn lowpass_passes_dc_and_rejects_nyquist() {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, 1000.0, 48000.0);
        assert!((c.dc_gain() - 1.0).abs() < 1e-12);

        let mut lp = Biquad::new(c);
        let mut y = 0.0;
        for i in 0..4800 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            y = lp.process(x);
        }
        assert!(y.abs() < 1e-3, "y={y}");
    }

    #[test]
    fn highpass_blocks_dc() {
        let c = BiquadCoeffs::<f32>::butterworth(FilterKind::Highpass, 20.0, 48000.0);
        let mut hp = Biquad::new(c);
        let mut y = 1.0;
        for _ in 0..48000 {
            y = hp.process(1.0_f32);
        }
        assert!(y.abs() < 1e-2, "y={y}");
    }

    #[test]
    fn primed_section_has_no_startup_transient() {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, 300.0, 8000.0);
        let mut lp = Biquad::new(c);
        lp.prime(0.5);
        for _ in 0..100 {
            assert!((lp.process(0.5) - 0.5).abs() < 1e-12);
        }
        lp.reset();
        assert!(lp.process(0.5) < 0.5);
    }

    #[test]
    fn filtfilt_keeps_constant_signal() {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, 50.0, 8000.0);
        let mut x = [0.25_f32; 500];
        filtfilt(&c, &mut x);
        for s in x {
            assert!((s - 0.25).abs() < 1e-5, "s={s}");
        }
    }

    #[test]
    fn filtfilt_introduces_no_lag() {
        let sr = 1000.0;
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, 100.0, sr);
        let input: Vec<f32> = (0..2000_i32)
            .map(|i| (TAU * 5.0 * f64::from(i) / sr).sin() as f32)
            .collect();
        let mut y = input.clone();
        filtfilt(&c, &mut y);
        // a causal pass would lag by several samples; forward-backward does not
        for i in 100..1900 {
            assert!((y[i] - input[i]).abs() < 5e-3, "i={i} y={} x={}", y[i], input[i]);
        }
    }

    #[test]
    fn filtfilt_highpass_removes_offset() {
        let sr = 8000.0;
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Highpass, 18.0, sr);
        let mut x: Vec<f32> = (0..16000_i32)
            .map(|i| 0.3 + (TAU * 1000.0 * f64::from(i) / sr).sin() as f32 * 0.1)
            .collect();
        filtfilt(&c, &mut x);
        let mid = &x[4000..12000];
        let m = mid.iter().map(|&v| f64::from(v)).sum::<f64>() / mid.len() as f64;
        assert!(m.abs() < 0.01, "mean={m}");
    }

    #[test]
    fn filtfilt_tiny_inputs() {
        let c = BiquadCoeffs::<f64>::butterworth(FilterKind::Lowpass, 100.0, 1000.0);
        let mut empty: [f32; 0] = [];
        filtfilt(&c, &mut empty);
        let mut one = [0.7_f32];
        filtfilt(&c, &mut one);
        assert!((one[0] - 0.7).abs() < 1e-6);
        let mut three = [0.1_f32, 0.2, 0.3];
        filtfilt(&c, &mut three);
        assert!(three.iter().all(|v| v.is_finite()));
    }
}
