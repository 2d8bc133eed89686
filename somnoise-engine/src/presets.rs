//! The four noise presets and the state each one carries across blocks.
//!
//! A preset is a pure function of (block request, current state) → (block,
//! next state). The state record is a tagged variant holding only what its
//! preset needs, so there is never any doubt which fields are live.
//!
//! Presets do not clip; the driver applies the final safety clip.

use rand::Rng;
use somnoise_core::dsp::GAIN_MINUS_6DB;
use somnoise_core::window::WindowedAverager;

use crate::config::Preset;
use crate::nodes::{white, DropletScheduler, RandomWalk, Swell};

/// Anything that can render the next block of a continuous signal.
pub trait Synthesizer {
    /// Produce the next `n` samples and advance internal state.
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32>;
}

/// Box-filter width for a crude low-pass at roughly `sr / divisor`.
#[inline]
fn window_for(sample_rate: u32, divisor: u32) -> usize {
    (sample_rate / divisor).max(3) as usize
}

#[inline]
fn apply_gain(block: &mut [f32], gain: f32) {
    for s in block.iter_mut() {
        *s *= gain;
    }
}

// --------------------------------- Brown -----------------------------------------

/// Brown noise: recentered random walk at −6 dB.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrownState {
    pub walk: RandomWalk,
}

impl BrownState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One block of the recentered walk, before the output trim.
fn brown_walk<R: Rng + ?Sized>(walk: &mut RandomWalk, n: usize, rng: &mut R) -> Vec<f32> {
    let steps = white(rng, n, 1.0);
    let mut y = walk.integrate(&steps);
    walk.recenter(&mut y);
    y
}

impl Synthesizer for BrownState {
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32> {
        let mut y = brown_walk(&mut self.walk, n, rng);
        apply_gain(&mut y, GAIN_MINUS_6DB);
        y
    }
}

// --------------------------------- Fan -------------------------------------------

/// Fan hum: brown walk blended 70/30 with independent quiet white noise, then
/// box-filtered at about `sr / 800` to take the edge off.
#[derive(Clone, Debug, PartialEq)]
pub struct FanState {
    pub walk: RandomWalk,
    pub lowpass: WindowedAverager,
}

impl FanState {
    pub const HISS_STD: f32 = 0.05;

    pub fn new(sample_rate: u32) -> Self {
        Self {
            walk: RandomWalk::new(),
            lowpass: WindowedAverager::new(window_for(sample_rate, 800)),
        }
    }
}

impl Synthesizer for FanState {
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32> {
        let walk = brown_walk(&mut self.walk, n, rng);
        let hiss = white(rng, n, Self::HISS_STD);
        let mix: Vec<f32> = walk
            .iter()
            .zip(&hiss)
            .map(|(&b, &h)| 0.7 * b + 0.3 * h)
            .collect();
        let mut y = self.lowpass.process(&mix);
        apply_gain(&mut y, GAIN_MINUS_6DB);
        y
    }
}

// --------------------------------- Rain ------------------------------------------

/// Rain on a window: band-limited hiss plus sparse droplets.
///
/// The hiss is white noise minus its `sr / 200` box average (a high band),
/// smoothed again at `sr / 3500`.
#[derive(Clone, Debug, PartialEq)]
pub struct RainState {
    pub low: WindowedAverager,
    pub band: WindowedAverager,
    pub droplets: DropletScheduler,
    sample_rate: u32,
}

impl RainState {
    pub const HISS_STD: f32 = 0.05;

    pub fn new(sample_rate: u32) -> Self {
        Self::with_droplet_rate(sample_rate, DropletScheduler::DEFAULT_RATE)
    }

    pub fn with_droplet_rate(sample_rate: u32, rate_per_second: f64) -> Self {
        Self {
            low: WindowedAverager::new(window_for(sample_rate, 200)),
            band: WindowedAverager::new(window_for(sample_rate, 3500)),
            droplets: DropletScheduler::new(rate_per_second),
            sample_rate,
        }
    }
}

impl Synthesizer for RainState {
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32> {
        let hiss = white(rng, n, Self::HISS_STD);
        let low = self.low.process(&hiss);
        let high: Vec<f32> = hiss.iter().zip(&low).map(|(&x, &l)| x - l).collect();
        let mut y = self.band.process(&high);
        self.droplets.inject(&mut y, self.sample_rate, rng);
        y
    }
}

// --------------------------------- Ocean -----------------------------------------

/// Ocean waves: low-passed noise under a slow swell whose period wanders
/// between 8 and 14 seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct OceanState {
    pub lowpass: WindowedAverager,
    pub swell: Swell,
    sample_rate: u32,
}

impl OceanState {
    pub const SURF_STD: f32 = 0.04;

    pub fn new<R: Rng + ?Sized>(sample_rate: u32, rng: &mut R) -> Self {
        Self::with_swell(sample_rate, Swell::random(rng))
    }

    pub fn with_swell(sample_rate: u32, swell: Swell) -> Self {
        Self {
            lowpass: WindowedAverager::new(window_for(sample_rate, 600)),
            swell,
            sample_rate,
        }
    }
}

impl Synthesizer for OceanState {
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32> {
        let surf = white(rng, n, Self::SURF_STD);
        let mut y = self.lowpass.process(&surf);
        let env = self.swell.envelope(n, self.sample_rate);
        for (s, e) in y.iter_mut().zip(&env) {
            *s *= e;
        }
        // takes effect from the next block on
        self.swell.maybe_redraw(rng);
        y
    }
}

// --------------------------------- Dispatch --------------------------------------

/// Per-run synthesis state, one case per preset.
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisState {
    Brown(BrownState),
    Fan(FanState),
    Rain(RainState),
    Ocean(OceanState),
}

impl SynthesisState {
    /// Fresh state for `preset`. The ocean preset draws its first wave period
    /// from `rng`; the others do not touch it.
    pub fn new<R: Rng + ?Sized>(preset: Preset, sample_rate: u32, rng: &mut R) -> Self {
        match preset {
            Preset::BrownNoise => SynthesisState::Brown(BrownState::new()),
            Preset::FanNoise => SynthesisState::Fan(FanState::new(sample_rate)),
            Preset::RainWindow => SynthesisState::Rain(RainState::new(sample_rate)),
            Preset::OceanWaves => SynthesisState::Ocean(OceanState::new(sample_rate, rng)),
        }
    }

    pub fn preset(&self) -> Preset {
        match self {
            SynthesisState::Brown(_) => Preset::BrownNoise,
            SynthesisState::Fan(_) => Preset::FanNoise,
            SynthesisState::Rain(_) => Preset::RainWindow,
            SynthesisState::Ocean(_) => Preset::OceanWaves,
        }
    }
}

impl Synthesizer for SynthesisState {
    fn render<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<f32> {
        match self {
            SynthesisState::Brown(s) => s.render(n, rng),
            SynthesisState::Fan(s) => s.render(n, rng),
            SynthesisState::Rain(s) => s.render(n, rng),
            SynthesisState::Ocean(s) => s.render(n, rng),
        }
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use somnoise_core::dsp::{mean, peak};

    fn render_blocks(state: &mut SynthesisState, blocks: &[usize], seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        blocks.iter().flat_map(|&n| state.render(n, &mut rng)).collect()
    }

    #[test]
    fn state_matches_preset() {
        let mut rng = StdRng::seed_from_u64(0);
        for p in Preset::ALL {
            assert_eq!(SynthesisState::new(p, 44_100, &mut rng).preset(), p);
        }
    }

    #[test]
    fn window_sizes_follow_sample_rate() {
        let fan = FanState::new(44_100);
        assert_eq!(fan.lowpass.window(), 55);
        let rain = RainState::new(44_100);
        assert_eq!(rain.low.window(), 220);
        assert_eq!(rain.band.window(), 12);
        let rain = RainState::new(8000);
        assert_eq!(rain.band.window(), 3); // floor(8000/3500) = 2, raised to 3
        let ocean = OceanState::with_swell(48_000, Swell::new(10.0));
        assert_eq!(ocean.lowpass.window(), 80);
    }

    #[test]
    fn every_preset_is_deterministic_for_a_seed() {
        for p in Preset::ALL {
            let mut rng = StdRng::seed_from_u64(11);
            let mut a = SynthesisState::new(p, 8000, &mut rng);
            let mut rng = StdRng::seed_from_u64(11);
            let mut b = SynthesisState::new(p, 8000, &mut rng);
            let ya = render_blocks(&mut a, &[4096, 1000], 99);
            let yb = render_blocks(&mut b, &[4096, 1000], 99);
            assert_eq!(ya.len(), 5096);
            assert_eq!(ya, yb, "{p}");
            assert!(ya.iter().all(|s| s.is_finite()), "{p}");
        }
    }

    #[test]
    fn presets_stay_inside_full_scale() {
        for p in Preset::ALL {
            let mut rng = StdRng::seed_from_u64(21);
            let mut state = SynthesisState::new(p, 44_100, &mut rng);
            let y = render_blocks(&mut state, &[65_536, 65_536, 30_000], 22);
            assert!(peak(&y) < 1.0, "{p}: peak={}", peak(&y));
            assert!(peak(&y) > 0.0, "{p}");
        }
    }

    #[test]
    fn brown_blocks_are_recentered() {
        let mut state = BrownState::new();
        let mut rng = StdRng::seed_from_u64(8);
        for n in [65_536, 1234, 7] {
            let y = state.render(n, &mut rng);
            assert!(mean(&y).abs() < 1e-5, "n={n} mean={}", mean(&y));
            // carried value is the last sample before the −6 dB trim
            let last = y[n - 1] / GAIN_MINUS_6DB;
            assert!((state.walk.last() - last).abs() < 1e-5);
        }
    }

    #[test]
    fn fan_tail_tracks_latest_mix() {
        let mut state = FanState::new(8000);
        let mut rng = StdRng::seed_from_u64(4);
        state.render(4, &mut rng);
        // window 10: tail is 9 long even after a 4-sample first block
        assert_eq!(state.lowpass.tail().len(), 9);
        assert!(state.lowpass.tail()[..5].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn rain_counts_droplets() {
        let mut state = RainState::with_droplet_rate(8000, 50.0);
        let mut rng = StdRng::seed_from_u64(6);
        let y = state.render(16_000, &mut rng);
        assert!(state.droplets.injected() > 30);
        assert!(peak(&y) < 0.5);
    }

    #[test]
    fn ocean_phase_and_period_stay_valid() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = OceanState::new(8000, &mut rng);
        for _ in 0..40 {
            let y = state.render(8000, &mut rng);
            assert_eq!(y.len(), 8000);
            assert!((0.0..somnoise_core::dsp::TAU).contains(&state.swell.phase()));
            let p = state.swell.period_seconds();
            assert!((Swell::MIN_PERIOD_S..Swell::MAX_PERIOD_S).contains(&p));
        }
    }
}
