//! Block-wise moving average with tail carry.
//!
//! A box filter of width `w` needs the previous `w − 1` inputs to produce the
//! first output of a block. Those samples are the *tail*: returned by every
//! call and handed back on the next one, so a signal fed in arbitrary chunks
//! yields the same output as one continuous pass.
//!
//! Each call builds an `f64` prefix sum over `tail ++ x`, which makes the cost
//! O(n) per block independent of `w`, and restarts the accumulator at every
//! block so rounding error cannot build up over multi-hour runs.

use alloc::vec::Vec;

/// Simple moving average of width `window` over the continuous signal `tail ++ x`.
///
/// Returns `(y, new_tail)` where `y.len() == x.len()` and, for `window > 1`,
/// `new_tail.len() == window - 1`. A tail shorter than `window − 1` is
/// zero-padded on the left (start of a run); a longer one contributes only its
/// most recent `window − 1` samples.
///
/// `window <= 1` is the identity: `y` equals `x` and the tail comes back unchanged.
pub fn moving_average(x: &[f32], window: usize, tail: &[f32]) -> (Vec<f32>, Vec<f32>) {
    if window <= 1 {
        return (x.to_vec(), tail.to_vec());
    }
    let keep = window - 1;

    let mut extended = Vec::with_capacity(keep + x.len());
    if tail.len() < keep {
        extended.resize(keep - tail.len(), 0.0_f32);
        extended.extend_from_slice(tail);
    } else {
        extended.extend_from_slice(&tail[tail.len() - keep..]);
    }
    extended.extend_from_slice(x);

    // prefix[k] = sum of extended[..k]
    let mut prefix = Vec::with_capacity(extended.len() + 1);
    let mut acc = 0.0_f64;
    prefix.push(acc);
    for &s in &extended {
        acc += f64::from(s);
        prefix.push(acc);
    }

    let inv_w = 1.0 / window as f64;
    let y = (0..x.len())
        .map(|i| ((prefix[i + window] - prefix[i]) * inv_w) as f32)
        .collect();

    let new_tail = extended[extended.len() - keep..].to_vec();
    (y, new_tail)
}

/// Owning moving-average filter: window size plus the carried tail.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowedAverager {
    window: usize,
    tail: Vec<f32>,
}

impl WindowedAverager {
    /// A fresh filter at the start of a run (empty tail, implicitly zeros).
    #[inline]
    pub fn new(window: usize) -> Self {
        Self { window, tail: Vec::new() }
    }

    #[inline] pub fn window(&self) -> usize { self.window }
    #[inline] pub fn tail(&self) -> &[f32] { &self.tail }

    /// Filter one block, carrying the tail into the next call.
    pub fn process(&mut self, x: &[f32]) -> Vec<f32> {
        let (y, tail) = moving_average(x, self.window, &self.tail);
        self.tail = tail;
        y
    }
}

// ------------------------------------ Tests --------------------------------------
