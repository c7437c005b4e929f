//! Foundation code used almost everywhere else: numeric types and
//! helpers, geometric classes, and a small random number generator.

pub mod common;
pub mod geometry;
pub mod rng;
