//! Building blocks (nodes) the noise presets are wired from.
//!
//! Every node here is a small state record that is fed one block at a time and
//! carries exactly what the next block needs to continue seamlessly.
//!
//! Contents:
//! - `white`            : block of scaled standard-normal noise
//! - `RandomWalk`       : brown-noise integrator with carried end value
//! - `Swell`            : slow amplitude envelope with a continuous phase accumulator
//! - `DropletScheduler` : Poisson-timed, exponentially decaying noise bursts

use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use somnoise_core::dsp::TAU;

/// Integration constant of the brown-noise walk (per standard-normal step).
pub const WALK_STEP: f32 = 0.002;

/// `n` standard-normal samples scaled by `std_dev`.
#[inline]
pub fn white<R: Rng + ?Sized>(rng: &mut R, n: usize, std_dev: f32) -> Vec<f32> {
    (0..n)
        .map(|_| rng.sample::<f32, _>(StandardNormal) * std_dev)
        .collect()
}

// --------------------------------- Random walk -----------------------------------

/// Discrete random walk (Wiener-process approximation).
///
/// `y[k] = last + WALK_STEP * (w[0] + … + w[k])`; the final value is carried
/// into the next block.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RandomWalk {
    last: f32,
}

impl RandomWalk {
    #[inline] pub fn new() -> Self { Self::default() }
    #[inline] pub fn last(&self) -> f32 { self.last }

    /// Integrate one block of white noise, continuing from the carried value.
    pub fn integrate(&mut self, white: &[f32]) -> Vec<f32> {
        let step = f64::from(WALK_STEP);
        let mut acc = f64::from(self.last);
        let y: Vec<f32> = white
            .iter()
            .map(|&w| {
                acc += step * f64::from(w);
                acc as f32
            })
            .collect();
        if let Some(&end) = y.last() {
            self.last = end;
        }
        y
    }

    /// Subtract the block's own mean and carry the recentered end value.
    ///
    /// This is a per-block DC correction, not a running one: consecutive blocks
    /// can meet at slightly different levels.
    pub fn recenter(&mut self, y: &mut [f32]) {
        let m = somnoise_core::dsp::mean(y) as f32;
        for s in y.iter_mut() {
            *s -= m;
        }
        if let Some(&end) = y.last() {
            self.last = end;
        }
    }
}

// --------------------------------- Swell LFO -------------------------------------

/// Slow amplitude envelope `0.4 + 0.6 * (0.5 + 0.5 * sin(phase))`.
///
/// The phase (radians, wrapped to [0, 2π)) advances at `2π / period` per second
/// and never jumps at block seams. A new period only affects later blocks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Swell {
    phase: f64,
    period_seconds: f64,
}

impl Swell {
    pub const MIN_PERIOD_S: f64 = 8.0;
    pub const MAX_PERIOD_S: f64 = 14.0;
    /// Chance, per block, that the wave period is redrawn.
    pub const REDRAW_PROBABILITY: f64 = 0.2;

    #[inline]
    pub fn new(period_seconds: f64) -> Self {
        Self { phase: 0.0, period_seconds }
    }

    /// Start at phase 0 with a period drawn uniformly from [8, 14) s.
    #[inline]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(Self::MIN_PERIOD_S..Self::MAX_PERIOD_S))
    }

    #[inline] pub fn phase(&self) -> f64 { self.phase }
    #[inline] pub fn period_seconds(&self) -> f64 { self.period_seconds }

    /// Envelope for the next `n` samples; advances the phase by `ω n / sr`.
    pub fn envelope(&mut self, n: usize, sr: u32) -> Vec<f32> {
        let sr = f64::from(sr);
        let omega = TAU / self.period_seconds;
        let env = (0..n)
            .map(|k| {
                let s = (self.phase + omega * (k as f64 / sr)).sin();
                (0.4 + 0.6 * (0.5 + 0.5 * s)) as f32
            })
            .collect();
        self.phase = (self.phase + omega * (n as f64 / sr)).rem_euclid(TAU);
        env
    }

    /// With probability [`Self::REDRAW_PROBABILITY`], pick a new period.
    pub fn maybe_redraw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if rng.gen_bool(Self::REDRAW_PROBABILITY) {
            self.period_seconds = rng.gen_range(Self::MIN_PERIOD_S..Self::MAX_PERIOD_S);
            true
        } else {
            false
        }
    }
}

// --------------------------------- Droplets --------------------------------------

/// Sparse transient "droplets" for the rain preset.
///
/// The number of events in a block is Poisson with mean `rate × block_seconds`.
/// Draws are independent per block: nothing (no partial burst, no fractional
/// expectation) carries over a seam.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DropletScheduler {
    rate_per_second: f64,
    injected: u64,
}

impl DropletScheduler {
    /// One droplet every two minutes on average.
    pub const DEFAULT_RATE: f64 = 1.0 / 120.0;
    /// Longest burst, in seconds.
    pub const BURST_SECONDS: f64 = 0.01;
    /// Decay time constant of a burst, in seconds.
    pub const DECAY_SECONDS: f64 = 0.003;
    /// Burst amplitude (std-dev of the noise under the envelope).
    pub const BURST_GAIN: f32 = 0.01;

    #[inline]
    pub fn new(rate_per_second: f64) -> Self {
        Self { rate_per_second, injected: 0 }
    }

    #[inline] pub fn rate_per_second(&self) -> f64 { self.rate_per_second }

    /// Droplets added over the life of this scheduler.
    #[inline] pub fn injected(&self) -> u64 { self.injected }

    /// Event count for a block lasting `block_seconds`.
    pub fn draw_count<R: Rng + ?Sized>(&self, block_seconds: f64, rng: &mut R) -> u64 {
        let lambda = self.rate_per_second * block_seconds;
        match Poisson::new(lambda) {
            Ok(dist) => {
                let k: f64 = dist.sample(rng);
                k as u64
            }
            // zero or non-finite mean: no events
            Err(_) => 0,
        }
    }

    /// Add this block's droplets into `band`. Returns how many were added.
    pub fn inject<R: Rng + ?Sized>(&mut self, band: &mut [f32], sr: u32, rng: &mut R) -> u64 {
        let n = band.len();
        if n == 0 {
            return 0;
        }
        let srf = f64::from(sr);
        let events = self.draw_count(n as f64 / srf, rng);
        let max_len = (srf * Self::BURST_SECONDS) as usize;
        let decay = srf * Self::DECAY_SECONDS;

        let mut added = 0;
        for _ in 0..events {
            let onset = rng.gen_range(0..n);
            let len = max_len.min(n - onset);
            if len == 0 {
                continue;
            }
            for (k, s) in band[onset..onset + len].iter_mut().enumerate() {
                let env = (-(k as f64) / decay).exp() as f32;
                *s += rng.sample::<f32, _>(StandardNormal) * env * Self::BURST_GAIN;
            }
            added += 1;
        }
        self.injected += added;
        added
    }
}

impl Default for DropletScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATE)
    }
}

// ------------------------------------ Tests --------------------------------------
