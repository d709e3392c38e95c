//! Spin spherical harmonic transforms by separation of variables
//!
//! Both directions factor into a longitude Fourier step and a colatitude
//! projection against Wigner-d kernels. The inverse synthesizes each ring
//! with an FFT after projecting coefficients through the kernel; the forward
//! analyzes each ring with an FFT, then projects against the
//! quadrature-weighted kernel. On the mw and mwss grids the forward first
//! regrids the signal onto the symmetric grid at twice the bandlimit, where
//! the colatitude quadrature is exact.

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;

use crate::error::{Result, TransformError};
use crate::fourier::{bins_to_coeffs, coeffs_to_bins, transform_lanes};
use crate::precompute::{self, BundleKey, Direction, PrecomputeBundle};
use crate::resample::{mw_to_mwss, upsample_by_two_mwss};
use crate::sampling::{self, f_shape, flm_shape, Sampling};

/// Synthesize a signal on the sphere from its harmonic coefficients
///
/// # Arguments
/// * `flm` - Coefficients of shape `[L, 2L-1]`, order `m` in column `L-1+m`
/// * `l` - Harmonic bandlimit
/// * `sampling` - Target sampling scheme
/// * `reality` - Assume `flm` carries the conjugate symmetry of a real
///   signal; only the columns `m >= 0` are read
/// * `precomputes` - Optional kernel bundle from [`generate_precomputes`]
///   with `forward = false`; built on the fly when absent
///
/// [`generate_precomputes`]: crate::precompute::generate_precomputes
pub fn inverse(
    flm: &Array2<Complex64>,
    l: usize,
    sampling: Sampling,
    reality: bool,
    precomputes: Option<&PrecomputeBundle>,
) -> Result<Array2<Complex64>> {
    sampling::validate_bandlimit(l)?;
    check_shape2(flm.dim(), flm_shape(l), "flm")?;
    let expected = BundleKey {
        l,
        n_max: None,
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
            owned = precompute::generate_precomputes(l, false, sampling, reality)?;
            &owned
        }
    };
    inverse_with_kernel(flm, l, 0, sampling, reality, bundle.kernel(0))
}

/// Recover harmonic coefficients from a signal on the sphere
///
/// # Arguments
/// * `f` - Samples of shape `[ntheta, nphi]` for `(l, sampling)`
/// * `reality` - Treat `f` as real-valued (the imaginary part is ignored)
///   and exploit conjugate symmetry; the output still carries all orders
/// * `precomputes` - Optional kernel bundle built with `forward = true`
pub fn forward(
    f: &Array2<Complex64>,
    l: usize,
    sampling: Sampling,
    reality: bool,
    precomputes: Option<&PrecomputeBundle>,
) -> Result<Array2<Complex64>> {
    sampling::validate_bandlimit(l)?;
    check_shape2(f.dim(), f_shape(l, sampling), "f")?;
    let expected = BundleKey {
        l,
        n_max: None,
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
            owned = precompute::generate_precomputes(l, true, sampling, reality)?;
            &owned
        }
    };
    forward_with_kernel(f, l, 0, sampling, reality, bundle.kernel(0))
}

pub(crate) fn check_shape2(got: (usize, usize), want: (usize, usize), name: &str) -> Result<()> {
    if got != want {
        return Err(TransformError::invalid(format!(
            "{name} has shape [{}, {}], expected [{}, {}]",
            got.0, got.1, want.0, want.1
        )));
    }
    Ok(())
}

/// Inverse transform against an explicit kernel table
///
/// The kernel decides the ring set (it was tabulated on the signal grid) and
/// whether only `m >= 0` columns are present. `spin` contributes the
/// `(-1)^spin` phase of the spin-weighted harmonics; the rotation-group
/// engine passes nonzero values here.
pub(crate) fn inverse_with_kernel(
    flm: &Array2<Complex64>,
    l: usize,
    spin: i64,
    sampling: Sampling,
    reality: bool,
    kernel: &Array3<f64>,
) -> Result<Array2<Complex64>> {
    let (ntheta, nphi) = f_shape(l, sampling);
    let sign = if spin.rem_euclid(2) == 1 { -1.0 } else { 1.0 };
    let mdim = kernel.dim().2;
    let moff = if reality { l - 1 } else { 0 };

    let mut ftm = Array2::<Complex64>::zeros((ntheta, mdim));
    for t in 0..ntheta {
        for mi in 0..mdim {
            let mut acc = Complex64::new(0.0, 0.0);
            for el in 0..l {
                acc += flm[[el, moff + mi]] * kernel[[t, el, mi]];
            }
            ftm[[t, mi]] = sign * acc;
        }
    }

    let mut f = Array2::<Complex64>::zeros((ntheta, nphi));
    if reality {
        let mut planner = RealFftPlanner::<f64>::new();
        let c2r = planner.plan_fft_inverse(nphi);
        let mut spec = vec![Complex64::new(0.0, 0.0); nphi / 2 + 1];
        let mut ring = vec![0.0; nphi];
        for t in 0..ntheta {
            for s in spec.iter_mut() {
                *s = Complex64::new(0.0, 0.0);
            }
            for (s, mi) in spec.iter_mut().zip(0..mdim) {
                *s = ftm[[t, mi]];
            }
            // the zero-frequency bin of a real ring is real up to rounding
            spec[0].im = 0.0;
            c2r.process(&mut spec, &mut ring).map_err(fft_error)?;
            for (p, v) in ring.iter().enumerate() {
                f[[t, p]] = Complex64::new(*v, 0.0);
            }
        }
    } else {
        let mut planner = FftPlanner::<f64>::new();
        let inv = planner.plan_fft_inverse(nphi);
        for t in 0..ntheta {
            let row: Vec<Complex64> = ftm.row(t).to_vec();
            let mut bins = coeffs_to_bins(&row, -(l as i64 - 1), nphi);
            inv.process(&mut bins);
            for (p, v) in bins.iter().enumerate() {
                f[[t, p]] = *v;
            }
        }
    }
    Ok(f)
}

/// Forward transform against an explicit quadrature-weighted kernel table
pub(crate) fn forward_with_kernel(
    f: &Array2<Complex64>,
    l: usize,
    spin: i64,
    sampling: Sampling,
    reality: bool,
    kernel: &Array3<f64>,
) -> Result<Array2<Complex64>> {
    // mw/mwss quadrature is exact only at bandlimit 2L, so lift the signal
    // onto the symmetric grid there first; dh is exact as sampled
    let mut f_quad = match sampling {
        Sampling::Mw => upsample_by_two_mwss(&mw_to_mwss(f, l, spin), l, spin),
        Sampling::Mwss => upsample_by_two_mwss(f, l, spin),
        Sampling::Dh => f.clone(),
    };
    let ntq = f_quad.nrows();
    let nphi_q = f_quad.ncols();
    let sign = if spin.rem_euclid(2) == 1 { -1.0 } else { 1.0 };
    let mdim = kernel.dim().2;
    let moff = if reality { l - 1 } else { 0 };

    let mut ftm = Array2::<Complex64>::zeros((ntq, mdim));
    if reality {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(nphi_q);
        let mut ring = vec![0.0; nphi_q];
        let mut spec = vec![Complex64::new(0.0, 0.0); nphi_q / 2 + 1];
        for t in 0..ntq {
            for (r, v) in ring.iter_mut().zip(f_quad.row(t).iter()) {
                *r = v.re;
            }
            r2c.process(&mut ring, &mut spec).map_err(fft_error)?;
            for mi in 0..mdim {
                ftm[[t, mi]] = spec[mi];
            }
        }
    } else {
        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(nphi_q);
        transform_lanes(&mut f_quad, Axis(1), &fwd);
        for t in 0..ntq {
            let bins = f_quad.row(t).to_vec();
            let coeffs = bins_to_coeffs(&bins, -(l as i64 - 1), 2 * l - 1);
            for (mi, c) in coeffs.iter().enumerate() {
                ftm[[t, mi]] = *c;
            }
        }
    }

    let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
    for el in 0..l {
        for mi in 0..mdim {
            let mut acc = Complex64::new(0.0, 0.0);
            for t in 0..ntq {
                acc += ftm[[t, mi]] * kernel[[t, el, mi]];
            }
            flm[[el, moff + mi]] = sign * acc;
        }
    }

    if reality {
        // fill m < 0 from the conjugate symmetry of real signals
        for el in 0..l {
            for m in 1..=el as i64 {
                let pos = flm[[el, (l as i64 - 1 + m) as usize]];
                let s = if m % 2 == 0 { 1.0 } else { -1.0 };
                flm[[el, (l as i64 - 1 - m) as usize]] = s * pos.conj();
            }
        }
    }
    Ok(flm)
}

pub(crate) fn fft_error(e: realfft::FftError) -> TransformError {
    TransformError::invalid(format!("real fft: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_inverse_zonal_matches_legendre() {
        // flm with only (l=2, m=0) set synthesizes to
        // sqrt(5/4pi) (3 cos^2 theta - 1) / 2, constant in longitude
        let l = 8;
        let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
        flm[[2, l - 1]] = Complex64::new(1.0, 0.0);
        let f = inverse(&flm, l, Sampling::Mw, false, None).unwrap();
        let thetas = sampling::thetas(l, Sampling::Mw);
        for (t, &th) in thetas.iter().enumerate() {
            let want = (5.0 / (4.0 * PI)).sqrt() * (3.0 * th.cos().powi(2) - 1.0) / 2.0;
            for p in 0..2 * l - 1 {
                assert!((f[[t, p]].re - want).abs() < 1e-13);
                assert!(f[[t, p]].im.abs() < 1e-13);
            }
        }
    }

    #[test]
    fn test_forward_constant_signal() {
        // f = 1 has a single coefficient sqrt(4 pi) at (0, 0)
        for sampling in [Sampling::Mw, Sampling::Mwss, Sampling::Dh] {
            let l = 6;
            let f = Array2::from_elem(f_shape(l, sampling), Complex64::new(1.0, 0.0));
            let flm = forward(&f, l, sampling, false, None).unwrap();
            for el in 0..l {
                for mi in 0..2 * l - 1 {
                    let want = if el == 0 && mi == l - 1 {
                        (4.0 * PI).sqrt()
                    } else {
                        0.0
                    };
                    assert!(
                        (flm[[el, mi]] - Complex64::new(want, 0.0)).norm() < 1e-12,
                        "{sampling} el={el} mi={mi}: {}",
                        flm[[el, mi]]
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_deterministic_coefficients() {
        for sampling in [Sampling::Mw, Sampling::Mwss, Sampling::Dh] {
            let l = 5;
            let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
            flm[[0, l - 1]] = Complex64::new(0.3, -0.1);
            flm[[2, l - 1 + 2]] = Complex64::new(-1.0, 0.4);
            flm[[3, l - 1 - 1]] = Complex64::new(0.8, 0.8);
            flm[[4, l - 1 - 4]] = Complex64::new(0.0, -0.6);
            let f = inverse(&flm, l, sampling, false, None).unwrap();
            let back = forward(&f, l, sampling, false, None).unwrap();
            for (a, b) in back.iter().zip(flm.iter()) {
                assert!((a - b).norm() < 1e-12, "{sampling}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_reality_path_matches_complex_path() {
        // coefficients with conjugate symmetry flm(-m) = (-1)^m conj(flm(m))
        let l = 6;
        let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
        flm[[1, l - 1]] = Complex64::new(0.7, 0.0);
        flm[[3, l - 1 + 2]] = Complex64::new(0.2, -0.9);
        flm[[3, l - 1 - 2]] = Complex64::new(0.2, 0.9);
        flm[[4, l - 1 + 1]] = Complex64::new(-0.5, 0.3);
        flm[[4, l - 1 - 1]] = Complex64::new(0.5, 0.3);

        let f_complex = inverse(&flm, l, Sampling::Mw, false, None).unwrap();
        let f_real = inverse(&flm, l, Sampling::Mw, true, None).unwrap();
        for (a, b) in f_real.iter().zip(f_complex.iter()) {
            assert!(b.im.abs() < 1e-12);
            assert!((a.re - b.re).abs() < 1e-12);
        }

        let back = forward(&f_real, l, Sampling::Mw, true, None).unwrap();
        for (a, b) in back.iter().zip(flm.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_shape_and_bundle_validation() {
        let l = 8;
        let flm = Array2::<Complex64>::zeros(flm_shape(l));
        assert!(inverse(&flm, l + 1, Sampling::Mw, false, None).is_err());

        let bundle = precompute::generate_precomputes(l, false, Sampling::Mw, false).unwrap();
        // direction mismatch
        let f = Array2::<Complex64>::zeros(f_shape(l, Sampling::Mw));
        assert!(forward(&f, l, Sampling::Mw, false, Some(&bundle)).is_err());
        // sampling mismatch
        assert!(inverse(&flm, l, Sampling::Dh, false, Some(&bundle)).is_err());
        // matches its own key
        assert!(inverse(&flm, l, Sampling::Mw, false, Some(&bundle)).is_ok());
    }
}
