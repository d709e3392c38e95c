//! Pixelization of the sphere and the rotation group
//!
//! Maps a harmonic bandlimit `L` (and directional bandlimit `N` for the
//! rotation group) onto an equiangular grid: number of samples per axis,
//! explicit angle arrays and quadrature weights.

pub mod quadrature;

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransformError};

/// Supported equiangular sampling schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampling {
    /// McEwen-Wiaux: L rings, 2L-1 longitudes, theta offset from the pole
    Mw,
    /// McEwen-Wiaux symmetric: L+1 rings including both poles, 2L longitudes
    Mwss,
    /// Driscoll-Healy: 2L rings, 2L-1 longitudes
    Dh,
}

impl Sampling {
    pub fn name(&self) -> &'static str {
        match self {
            Sampling::Mw => "mw",
            Sampling::Mwss => "mwss",
            Sampling::Dh => "dh",
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sampling {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mw" => Ok(Sampling::Mw),
            "mwss" => Ok(Sampling::Mwss),
            "dh" => Ok(Sampling::Dh),
            other => Err(TransformError::invalid(format!(
                "sampling scheme {other:?} not supported (expected mw, mwss or dh)"
            ))),
        }
    }
}

/// Number of colatitude rings
pub fn ntheta(l: usize, sampling: Sampling) -> usize {
    match sampling {
        Sampling::Mw => l,
        Sampling::Mwss => l + 1,
        Sampling::Dh => 2 * l,
    }
}

/// Number of longitude samples per ring
pub fn nphi(l: usize, sampling: Sampling) -> usize {
    match sampling {
        Sampling::Mw | Sampling::Dh => 2 * l - 1,
        Sampling::Mwss => 2 * l,
    }
}

/// Number of samples of the third Euler angle
pub fn ngamma(n: usize) -> usize {
    2 * n - 1
}

/// Colatitude of ring `t`
pub fn theta(t: usize, l: usize, sampling: Sampling) -> f64 {
    match sampling {
        Sampling::Mw => PI * (2 * t + 1) as f64 / (2 * l - 1) as f64,
        Sampling::Mwss => PI * t as f64 / l as f64,
        Sampling::Dh => PI * (2 * t + 1) as f64 / (4 * l) as f64,
    }
}

/// Colatitudes of all rings
pub fn thetas(l: usize, sampling: Sampling) -> Vec<f64> {
    (0..ntheta(l, sampling)).map(|t| theta(t, l, sampling)).collect()
}

/// Longitudes of all samples within a ring
pub fn phis(l: usize, sampling: Sampling) -> Vec<f64> {
    let n = nphi(l, sampling);
    (0..n).map(|p| 2.0 * PI * p as f64 / n as f64).collect()
}

/// Third Euler angle samples
pub fn gammas(n: usize) -> Vec<f64> {
    let ng = ngamma(n);
    (0..ng).map(|g| 2.0 * PI * g as f64 / ng as f64).collect()
}

/// Pixel-space shape `[ntheta, nphi]` of a signal on the sphere
pub fn f_shape(l: usize, sampling: Sampling) -> (usize, usize) {
    (ntheta(l, sampling), nphi(l, sampling))
}

/// Shape `[L, 2L-1]` of harmonic coefficients; the order index is offset by
/// `L-1` so that column `L-1+m` holds order `m`
pub fn flm_shape(l: usize) -> (usize, usize) {
    (l, 2 * l - 1)
}

/// Pixel-space shape `[2N-1, ntheta, nphi]` of a signal on the rotation
/// group, third Euler angle on the leading axis
pub fn f_shape_so3(l: usize, n: usize, sampling: Sampling) -> (usize, usize, usize) {
    (ngamma(n), ntheta(l, sampling), nphi(l, sampling))
}

/// Shape `[2N-1, L, 2L-1]` of Wigner coefficients, `n`-major
///
/// Note the axis order: some harmonic libraries store the directional index
/// on the trailing axis (`[L, 2L-1, 2N-1]`). Here it leads, so each plane is
/// a contiguous `[L, 2L-1]` coefficient set for one `n`; callers porting
/// data from an n-last layout must transpose.
pub fn flmn_shape(l: usize, n: usize) -> (usize, usize, usize) {
    (2 * n - 1, l, 2 * l - 1)
}

pub(crate) fn validate_bandlimit(l: usize) -> Result<()> {
    if l < 1 {
        return Err(TransformError::invalid("bandlimit L must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_directional(n: usize) -> Result<()> {
    if n < 1 {
        return Err(TransformError::invalid(
            "directional bandlimit N must be at least 1",
        ));
    }
    Ok(())
}

/// Full description of a spherical sampling grid
///
/// Pure function of `(L, sampling)`: angle arrays and per-ring quadrature
/// weights (solid-angle weight per pixel, i.e. theta weight times 2pi/nphi).
#[derive(Debug, Clone)]
pub struct SphereGrid {
    pub bandlimit: usize,
    pub sampling: Sampling,
    pub thetas: Vec<f64>,
    pub phis: Vec<f64>,
    pub quad_weights: Vec<f64>,
}

impl SphereGrid {
    pub fn new(l: usize, sampling: Sampling) -> Result<Self> {
        validate_bandlimit(l)?;
        let nphi = nphi(l, sampling) as f64;
        let quad_weights = quadrature::theta_weights(l, sampling)
            .iter()
            .map(|w| w * 2.0 * PI / nphi)
            .collect();
        Ok(SphereGrid {
            bandlimit: l,
            sampling,
            thetas: thetas(l, sampling),
            phis: phis(l, sampling),
            quad_weights,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        f_shape(self.bandlimit, self.sampling)
    }
}

/// Description of a rotation-group sampling grid
#[derive(Debug, Clone)]
pub struct RotationGrid {
    pub sphere: SphereGrid,
    pub directional_bandlimit: usize,
    pub gammas: Vec<f64>,
}

impl RotationGrid {
    pub fn new(l: usize, n: usize, sampling: Sampling) -> Result<Self> {
        validate_directional(n)?;
        Ok(RotationGrid {
            sphere: SphereGrid::new(l, sampling)?,
            directional_bandlimit: n,
            gammas: gammas(n),
        })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        let (nt, np) = self.sphere.shape();
        (ngamma(self.directional_bandlimit), nt, np)
    }
}
