//! # rs_hair
//!
//! [Rust][rust] crate for ray tracing hair and fiber geometry. Fibers
//! are radius-varying cubic curve segments collected into *curve
//! groups*, each indexed by a quantized four-wide bounding volume
//! hierarchy. The traversal core lives in
//! [accelerators::traverse][traverse]; the ray-space subdivision test
//! for a single fiber segment lives in [shapes::fiber][fiber].
//!
//! Rays are traced either one at a time or as small packets of
//! independent lanes; per-lane results never depend on lane order or
//! batch size.
//!
//! [rust]: https://www.rust-lang.org
//! [traverse]: accelerators/traverse/index.html
//! [fiber]: shapes/fiber/index.html

#[macro_use]
extern crate impl_ops;

pub mod accelerators;
pub mod blockqueue;
pub mod cameras;
pub mod core;
pub mod shapes;
pub mod workers;
