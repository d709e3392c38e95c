//! Wigner transforms on the rotation group SO(3)
//!
//! A signal on the rotation group factors over the third Euler angle: an FFT
//! over gamma splits it into `2N-1` spin signals on the sphere, one per
//! gamma frequency `n`, and each of those is transformed with the spin
//! spherical engine at spin `-n`. Coefficient arrays are `n`-major with
//! shape `[2N-1, L, 2L-1]`; frequency `n` lives in plane `N-1+n` and order
//! `m` in column `L-1+m`. This differs from conventions that put `n` on the
//! trailing axis: leading `n` keeps each spin slice contiguous, which is the
//! unit this engine consumes. Transpose when exchanging coefficients with an
//! n-last layout.

use std::f64::consts::PI;

use ndarray::{s, Array2, Array3};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;

use crate::error::{Result, TransformError};
use crate::fourier::bin_of;
use crate::precompute::{self, BundleKey, Direction, PrecomputeBundle};
use crate::sampling::{self, f_shape, f_shape_so3, flm_shape, flmn_shape, ngamma, Sampling};
use crate::spherical::{fft_error, forward_with_kernel, inverse_with_kernel};

/// Synthesize a signal on the rotation group from Wigner coefficients
///
/// # Arguments
/// * `flmn` - Coefficients of shape `[2N-1, L, 2L-1]`
/// * `l` - Harmonic bandlimit
/// * `n` - Directional bandlimit, `1 <= N <= L`
/// * `reality` - Assume `flmn` carries the conjugate symmetry of a real
///   signal; only the planes `n >= 0` are read
/// * `precomputes` - Optional bundle from [`generate_precomputes_wigner`]
///   with `forward = false`
///
/// [`generate_precomputes_wigner`]: crate::precompute::generate_precomputes_wigner
pub fn inverse(
    flmn: &Array3<Complex64>,
    l: usize,
    n: usize,
    sampling: Sampling,
    reality: bool,
    precomputes: Option<&PrecomputeBundle>,
) -> Result<Array3<Complex64>> {
    validate(l, n)?;
    check_shape3(flmn.dim(), flmn_shape(l, n), "flmn")?;
    let expected = BundleKey {
        l,
        n_max: Some(n),
        direction: Direction::Inverse,
        reality,
        sampling,
    };
    let owned;
    let bundle = match precomputes {
        Some(b) => {
            b.check(&expected)?;
            b
        }
        None => {
            owned = precompute::generate_precomputes_wigner(l, n, false, sampling, reality)?;
            &owned
        }
    };

    let ng = ngamma(n);
    let (ntheta, nphi) = f_shape(l, sampling);
    let mut f = Array3::<Complex64>::zeros((ng, ntheta, nphi));

    for (idx, nn) in precompute::wigner_spins(n, reality).enumerate() {
        let phase = if nn.rem_euclid(2) == 1 { -1.0 } else { 1.0 };
        let plane = (n as i64 - 1 + nn) as usize;
        let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
        for el in 0..l {
            let scale = phase * ((2 * el + 1) as f64 / (16.0 * PI.powi(3))).sqrt();
            for mi in 0..2 * l - 1 {
                flm[[el, mi]] = flmn[[plane, el, mi]] * scale;
            }
        }
        let slice = inverse_with_kernel(&flm, l, -nn, sampling, false, bundle.kernel(idx))?;
        f.slice_mut(s![bin_of(nn, ng), .., ..]).assign(&slice);
    }

    // synthesize the gamma axis; for real signals the frequencies n >= 0
    // are a complete half-spectrum
    if reality {
        let mut planner = RealFftPlanner::<f64>::new();
        let c2r = planner.plan_fft_inverse(ng);
        let mut spec = vec![Complex64::new(0.0, 0.0); ng / 2 + 1];
        let mut ring = vec![0.0; ng];
        for t in 0..ntheta {
            for p in 0..nphi {
                for (g, sp) in spec.iter_mut().enumerate() {
                    *sp = f[[g, t, p]];
                }
                spec[0].im = 0.0;
                c2r.process(&mut spec, &mut ring).map_err(fft_error)?;
                for (g, v) in ring.iter().enumerate() {
                    f[[g, t, p]] = Complex64::new(*v, 0.0);
                }
            }
        }
    } else {
        let mut planner = FftPlanner::<f64>::new();
        let inv = planner.plan_fft_inverse(ng);
        let mut buf = vec![Complex64::new(0.0, 0.0); ng];
        for t in 0..ntheta {
            for p in 0..nphi {
                for (g, b) in buf.iter_mut().enumerate() {
                    *b = f[[g, t, p]];
                }
                inv.process(&mut buf);
                for (g, b) in buf.iter().enumerate() {
                    f[[g, t, p]] = *b;
                }
            }
        }
    }
    Ok(f)
}

/// Recover Wigner coefficients from a signal on the rotation group
///
/// With `reality` set, only the planes `n >= 0` are computed; the negative
/// planes follow from `flmn(l, -m, -n) = (-1)^{m+n} conj(flmn(l, m, n))`.
pub fn forward(
    f: &Array3<Complex64>,
    l: usize,
    n: usize,
    sampling: Sampling,
    reality: bool,
    precomputes: Option<&PrecomputeBundle>,
) -> Result<Array3<Complex64>> {
    validate(l, n)?;
    check_shape3(f.dim(), f_shape_so3(l, n, sampling), "f")?;
    let expected = BundleKey {
        l,
        n_max: Some(n),
        direction: Direction::Forward,
        reality,
        sampling,
    };
    let owned;
    let bundle = match precomputes {
        Some(b) => {
            b.check(&expected)?;
            b
        }
        None => {
            owned = precompute::generate_precomputes_wigner(l, n, true, sampling, reality)?;
            &owned
        }
    };

    let ng = ngamma(n);
    let (ntheta, nphi) = f_shape(l, sampling);

    // analyze the gamma axis; real signals only need frequencies n >= 0
    let mut fnab;
    if reality {
        fnab = Array3::<Complex64>::zeros((ng, ntheta, nphi));
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(ng);
        let mut ring = vec![0.0; ng];
        let mut spec = vec![Complex64::new(0.0, 0.0); ng / 2 + 1];
        for t in 0..ntheta {
            for p in 0..nphi {
                for (r, g) in ring.iter_mut().zip(0..ng) {
                    *r = f[[g, t, p]].re;
                }
                r2c.process(&mut ring, &mut spec).map_err(fft_error)?;
                for (g, sp) in spec.iter().enumerate() {
                    fnab[[g, t, p]] = *sp;
                }
            }
        }
    } else {
        fnab = f.clone();
        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(ng);
        let mut buf = vec![Complex64::new(0.0, 0.0); ng];
        for t in 0..ntheta {
            for p in 0..nphi {
                for (g, b) in buf.iter_mut().enumerate() {
                    *b = fnab[[g, t, p]];
                }
                fwd.process(&mut buf);
                for (g, b) in buf.iter().enumerate() {
                    fnab[[g, t, p]] = *b;
                }
            }
        }
    }

    let gamma_weight = 2.0 * PI / ng as f64;
    let mut flmn = Array3::<Complex64>::zeros(flmn_shape(l, n));
    for (idx, nn) in precompute::wigner_spins(n, reality).enumerate() {
        let slice = fnab
            .slice(s![bin_of(nn, ng), .., ..])
            .map(|c| *c * gamma_weight);
        let glm = forward_with_kernel(&slice, l, -nn, sampling, false, bundle.kernel(idx))?;
        let phase = if nn.rem_euclid(2) == 1 { -1.0 } else { 1.0 };
        let plane = (n as i64 - 1 + nn) as usize;
        for el in 0..l {
            let scale = phase * (4.0 * PI / (2 * el + 1) as f64).sqrt();
            for mi in 0..2 * l - 1 {
                flmn[[plane, el, mi]] = glm[[el, mi]] * scale;
            }
        }
    }

    if reality {
        for nn in 1..n as i64 {
            let pos = (n as i64 - 1 + nn) as usize;
            let neg = (n as i64 - 1 - nn) as usize;
            for el in 0..l {
                for mi in 0..2 * l - 1 {
                    let m = mi as i64 - (l as i64 - 1);
                    let s = if (m.abs() + nn) % 2 == 0 { 1.0 } else { -1.0 };
                    flmn[[neg, el, mi]] = s * flmn[[pos, el, 2 * l - 2 - mi]].conj();
                }
            }
        }
    }
    Ok(flmn)
}

fn validate(l: usize, n: usize) -> Result<()> {
    sampling::validate_bandlimit(l)?;
    sampling::validate_directional(n)?;
    if n > l {
        return Err(TransformError::invalid(format!(
            "directional bandlimit N = {n} exceeds harmonic bandlimit L = {l}"
        )));
    }
    Ok(())
}

fn check_shape3(
    got: (usize, usize, usize),
    want: (usize, usize, usize),
    name: &str,
) -> Result<()> {
    if got != want {
        return Err(TransformError::invalid(format!(
            "{name} has shape [{}, {}, {}], expected [{}, {}, {}]",
            got.0, got.1, got.2, want.0, want.1, want.2
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spherical;

    #[test]
    fn test_single_direction_reduces_to_sphere() {
        // with N = 1 the gamma axis is trivial and the transform is a
        // rescaled spherical inverse
        let l = 6;
        let mut flmn = Array3::<Complex64>::zeros(flmn_shape(l, 1));
        flmn[[0, 2, l - 1 + 1]] = Complex64::new(1.0, -0.5);
        flmn[[0, 4, l - 1 - 3]] = Complex64::new(-0.2, 0.9);

        let f = inverse(&flmn, l, 1, Sampling::Mw, false, None).unwrap();

        let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
        for el in 0..l {
            let scale = ((2 * el + 1) as f64 / (16.0 * PI.powi(3))).sqrt();
            for mi in 0..2 * l - 1 {
                flm[[el, mi]] = flmn[[0, el, mi]] * scale;
            }
        }
        let f_sphere = spherical::inverse(&flm, l, Sampling::Mw, false, None).unwrap();
        for t in 0..l {
            for p in 0..2 * l - 1 {
                assert!((f[[0, t, p]] - f_sphere[[t, p]]).norm() < 1e-13);
            }
        }
    }

    #[test]
    fn test_round_trip_deterministic_coefficients() {
        let l = 4;
        let n = 2;
        let mut flmn = Array3::<Complex64>::zeros(flmn_shape(l, n));
        flmn[[0, 1, l - 1 + 1]] = Complex64::new(0.4, 0.2);
        flmn[[0, 3, l - 1 - 2]] = Complex64::new(-0.7, 0.1);
        flmn[[1, 0, l - 1]] = Complex64::new(1.0, -1.0);
        flmn[[1, 2, l - 1 + 2]] = Complex64::new(0.3, 0.8);
        flmn[[2, 2, l - 1 - 1]] = Complex64::new(-0.5, -0.4);
        flmn[[2, 3, l - 1 + 3]] = Complex64::new(0.6, 0.0);

        for sampling in [Sampling::Mw, Sampling::Mwss, Sampling::Dh] {
            let f = inverse(&flmn, l, n, sampling, false, None).unwrap();
            let back = forward(&f, l, n, sampling, false, None).unwrap();
            for (a, b) in back.iter().zip(flmn.iter()) {
                assert!((a - b).norm() < 1e-12, "{sampling}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_validation() {
        let l = 4;
        let flmn = Array3::<Complex64>::zeros(flmn_shape(l, 2));
        // N > L
        assert!(inverse(&flmn, 2, 3, Sampling::Mw, false, None).is_err());
        // shape mismatch
        assert!(inverse(&flmn, l, 3, Sampling::Mw, false, None).is_err());
        // bundle keyed for the other direction
        let bundle =
            precompute::generate_precomputes_wigner(l, 2, true, Sampling::Mw, false).unwrap();
        assert!(inverse(&flmn, l, 2, Sampling::Mw, false, Some(&bundle)).is_err());
    }
}
