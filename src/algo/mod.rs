//! Refinement algorithms on a lath topology.
//!
//! - **Subdivision**: lazy Catmull-Clark face refinement with semi-sharp
//!   creases, and detection of regular bicubic neighbourhoods
//! - **Progress**: callbacks for long tessellation runs

pub mod progress;
pub mod subdivide;

pub use progress::Progress;
