//! # Model Module
//!
//! The Li-Stephens copying model used to thread query haplotypes through
//! a reference panel.
//!
//! ## Core Pieces
//! - `parameters`: Per-query model parameters (recombination rate, error
//!   probability) and the transition/emission math derived from them
//! - `threader`: Viterbi decoding with traceback over a panel prefix
//!
//! ## Reference
//! Li N, Stephens M. Genetics 2003 Dec;165(4):2213-33

pub mod parameters;
pub mod threader;

pub use parameters::MatchParams;
pub use threader::{Algorithm, Threader};
