//! Sphere Harmonics - Spin Spherical Harmonic and Wigner Transform Core
//!
//! Exact forward and inverse transforms between pixel space and harmonic
//! space, on the sphere and on the rotation group, for the mw, mwss and dh
//! equiangular sampling schemes.

pub mod error;
mod fourier;
pub mod precompute;
mod resample;
pub mod sampling;
pub mod spherical;
pub mod wigner;
pub mod wigner_d;

pub use error::{Result, TransformError};
pub use precompute::{
    generate_precomputes, generate_precomputes_wigner, Direction, PrecomputeBundle,
};
pub use sampling::{RotationGrid, Sampling, SphereGrid};
