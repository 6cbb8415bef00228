//! Numeric helpers shared by the guiding tools.

pub mod stats;

pub use stats::{mean, median, rms_about_mean, same_sign_pairs};
