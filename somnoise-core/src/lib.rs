#![cfg_attr(not(feature = "std"), no_std)]
//! somnoise core: DSP primitives for long-form, block-streamed noise synthesis.
//!
//! Features
//! - `std`    : (default) use the Rust standard library
//! - `no-std` : build with `#![no_std]` (plus `alloc`) and use `libm` for math
//!
//! Modules
//! - [`dsp`]     : math backend, dB/linear conversion, meters (RMS, peak, mean), clipping
//! - [`window`]  : prefix-sum moving average with tail carry across blocks
//! - [`filters`] : 2nd-order Butterworth biquads and zero-phase forward-backward filtering
//!
//! Design
//! - Block-oriented: every stateful primitive can be fed a signal in arbitrary
//!   chunks and produces the same output as one continuous pass
//! - No logging, no I/O; the engine crate owns those concerns

extern crate alloc;

pub mod dsp;
pub mod filters;
pub mod window;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        db_to_lin, hard_clip_in_place, lin_to_db, mean, peak, rms, rms_db, EPS_LOG,
        GAIN_MINUS_6DB, TAU,
    };
    pub use crate::filters::{filtfilt, Biquad, BiquadCoeffs, FilterKind};
    pub use crate::window::{moving_average, WindowedAverager};
}
