//! Signal-independent kernel precomputation
//!
//! Building the Wigner-d projection kernels is the expensive part of a
//! transform (O(L^3) work and memory per spin index). A `PrecomputeBundle`
//! captures them once for a fixed `(L, [N], direction, reality, sampling)`
//! key so that repeated transforms amortize the cost. Bundles are immutable
//! after construction and safe to share across threads.

use std::f64::consts::PI;

use ndarray::Array3;

use crate::error::{Result, TransformError};
use crate::sampling::{self, quadrature, Sampling};
use crate::wigner_d;

/// Transform direction a bundle was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Inverse,
}

/// Identity of a bundle; transforms reject bundles whose key differs from
/// their own parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BundleKey {
    pub l: usize,
    pub n_max: Option<usize>,
    pub direction: Direction,
    pub reality: bool,
    pub sampling: Sampling,
}

impl BundleKey {
    fn describe(&self) -> String {
        match self.n_max {
            Some(n) => format!(
                "L={} N={} {:?} reality={} sampling={}",
                self.l, n, self.direction, self.reality, self.sampling
            ),
            None => format!(
                "L={} {:?} reality={} sampling={}",
                self.l, self.direction, self.reality, self.sampling
            ),
        }
    }
}

/// Immutable precomputed kernels for one transform configuration
///
/// Holds one kernel table per spin index: a single spin-0 table for sphere
/// transforms, `N` or `2N-1` tables for rotation-group transforms. Forward
/// kernels carry the quadrature weights folded in, so consuming code never
/// branches on direction.
#[derive(Debug, Clone)]
pub struct PrecomputeBundle {
    key: BundleKey,
    kernels: Vec<Array3<f64>>,
}

impl PrecomputeBundle {
    pub fn bandlimit(&self) -> usize {
        self.key.l
    }

    pub fn directional_bandlimit(&self) -> Option<usize> {
        self.key.n_max
    }

    pub fn direction(&self) -> Direction {
        self.key.direction
    }

    pub fn sampling(&self) -> Sampling {
        self.key.sampling
    }

    pub fn reality(&self) -> bool {
        self.key.reality
    }

    pub(crate) fn check(&self, expected: &BundleKey) -> Result<()> {
        if self.key != *expected {
            return Err(TransformError::invalid(format!(
                "precompute bundle keyed for ({}) used in a transform keyed ({})",
                self.key.describe(),
                expected.describe()
            )));
        }
        Ok(())
    }

    pub(crate) fn kernel(&self, index: usize) -> &Array3<f64> {
        &self.kernels[index]
    }
}

/// Precompute kernels for sphere transforms
///
/// # Arguments
/// * `l` - Harmonic bandlimit
/// * `forward` - Direction the kernels are weighted for
/// * `sampling` - Sampling scheme of the signals to transform
/// * `reality` - Whether transforms will exploit conjugate symmetry
pub fn generate_precomputes(
    l: usize,
    forward: bool,
    sampling: Sampling,
    reality: bool,
) -> Result<PrecomputeBundle> {
    sampling::validate_bandlimit(l)?;
    let direction = if forward { Direction::Forward } else { Direction::Inverse };
    ensure_feasible(kernel_elements(l, sampling, direction, reality))?;
    let key = BundleKey { l, n_max: None, direction, reality, sampling };
    Ok(PrecomputeBundle {
        key,
        kernels: vec![spin_kernel(l, 0, sampling, reality, direction)],
    })
}

/// Precompute kernels for rotation-group transforms, one per spin index
pub fn generate_precomputes_wigner(
    l: usize,
    n: usize,
    forward: bool,
    sampling: Sampling,
    reality: bool,
) -> Result<PrecomputeBundle> {
    sampling::validate_bandlimit(l)?;
    sampling::validate_directional(n)?;
    if n > l {
        return Err(TransformError::invalid(format!(
            "directional bandlimit N = {n} exceeds harmonic bandlimit L = {l}"
        )));
    }
    let direction = if forward { Direction::Forward } else { Direction::Inverse };
    let count = if reality { n } else { 2 * n - 1 } as u128;
    ensure_feasible(count * kernel_elements(l, sampling, direction, false))?;
    let key = BundleKey { l, n_max: Some(n), direction, reality, sampling };
    let kernels = wigner_spins(n, reality)
        .map(|nn| spin_kernel(l, -nn, sampling, false, direction))
        .collect();
    Ok(PrecomputeBundle { key, kernels })
}

/// Spin indices a rotation-group transform iterates over, lowest first
pub(crate) fn wigner_spins(n: usize, reality: bool) -> std::ops::Range<i64> {
    let start = if reality { 0 } else { 1 - n as i64 };
    start..n as i64
}

/// Projection kernel for one spin: `sqrt((2l+1)/4pi) d^l_{m,-spin}(theta_t)`
///
/// Inverse kernels are tabulated on the signal's own rings. Forward kernels
/// live on the quadrature grid instead (the symmetric grid at bandlimit 2L
/// for mw/mwss, the signal grid for dh) and absorb the ring weights and the
/// longitude normalization `2pi/nphi`.
pub(crate) fn spin_kernel(
    l: usize,
    spin: i64,
    sampling: Sampling,
    reality: bool,
    direction: Direction,
) -> Array3<f64> {
    let (thetas, weights) = match direction {
        Direction::Inverse => (sampling::thetas(l, sampling), None),
        Direction::Forward => match sampling {
            Sampling::Mw | Sampling::Mwss => {
                let w = quadrature::theta_weights(2 * l, Sampling::Mwss);
                let nphi = 2.0 * l as f64;
                (
                    sampling::thetas(2 * l, Sampling::Mwss),
                    Some(w.iter().map(|w| w * 2.0 * PI / nphi).collect::<Vec<_>>()),
                )
            }
            Sampling::Dh => {
                let w = quadrature::theta_weights(l, Sampling::Dh);
                let nphi = (2 * l - 1) as f64;
                (
                    sampling::thetas(l, Sampling::Dh),
                    Some(w.iter().map(|w| w * 2.0 * PI / nphi).collect::<Vec<_>>()),
                )
            }
        },
    };

    let mut dl = wigner_d::dl_table(&thetas, l, -spin);
    for el in 0..l {
        let norm = ((2 * el + 1) as f64 / (4.0 * PI)).sqrt();
        for t in 0..thetas.len() {
            let scale = norm * weights.as_ref().map_or(1.0, |w| w[t]);
            for mi in 0..2 * l - 1 {
                dl[[t, el, mi]] *= scale;
            }
        }
    }

    if reality && spin == 0 {
        // keep only m >= 0
        dl.slice(ndarray::s![.., .., l - 1..]).to_owned()
    } else {
        dl
    }
}

fn kernel_elements(l: usize, sampling: Sampling, direction: Direction, reality: bool) -> u128 {
    let ntheta = match direction {
        Direction::Inverse => sampling::ntheta(l, sampling),
        Direction::Forward => match sampling {
            Sampling::Mw | Sampling::Mwss => 2 * l + 1,
            Sampling::Dh => 2 * l,
        },
    } as u128;
    let mdim = if reality { l } else { 2 * l - 1 } as u128;
    ntheta * l as u128 * mdim
}

fn ensure_feasible(elements: u128) -> Result<()> {
    if elements.saturating_mul(std::mem::size_of::<f64>() as u128) > isize::MAX as u128 {
        return Err(TransformError::OutOfMemory { elements });
    }
    Ok(())
}
