//! Fourier-domain regridding between equiangular samplings
//!
//! Forward transforms on the mw/mwss grids project against quadrature
//! weights that are exact only at twice the signal bandlimit, so signals are
//! first extended periodically in colatitude and interpolated onto the
//! symmetric grid at bandlimit 2L. All interpolation here is exact for
//! bandlimited inputs: zero-padding in the Fourier domain, never splines.

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::fourier::{bins_to_coeffs, coeffs_to_bins, freq_of};

/// Extend an mw-sampled signal over the full periodic colatitude range
///
/// The extension doubles the theta domain to `[0, 2pi)`: ring `t` beyond the
/// south pole mirrors physical ring `2L-2-t` with the longitude Fourier
/// coefficients sign-flipped by `(-1)^{m+spin}` (a reflection through the
/// poles shifts longitude by pi).
pub(crate) fn periodic_extension_mw(
    f: &Array2<Complex64>,
    l: usize,
    spin: i64,
) -> Array2<Complex64> {
    let nphi = 2 * l - 1;
    let next = 2 * l - 1;
    let mut planner = FftPlanner::<f64>::new();
    let fwd = planner.plan_fft_forward(nphi);
    let inv = planner.plan_fft_inverse(nphi);

    let mut out = Array2::<Complex64>::zeros((next, nphi));
    out.slice_mut(ndarray::s![..l, ..]).assign(f);

    let mut buf = vec![Complex64::new(0.0, 0.0); nphi];
    for t in l..next {
        let src = 2 * l - 2 - t;
        for (b, v) in buf.iter_mut().zip(f.row(src).iter()) {
            *b = *v;
        }
        fwd.process(&mut buf);
        for (j, b) in buf.iter_mut().enumerate() {
            if (freq_of(j, nphi) + spin).rem_euclid(2) == 1 {
                *b = -*b;
            }
        }
        inv.process(&mut buf);
        for (j, b) in buf.iter().enumerate() {
            out[[t, j]] = *b / nphi as f64;
        }
    }
    out
}

/// Regrid an mw-sampled signal onto the mwss grid at the same bandlimit
pub(crate) fn mw_to_mwss(f: &Array2<Complex64>, l: usize, spin: i64) -> Array2<Complex64> {
    mw_to_mwss_phi(&mw_to_mwss_theta(f, l, spin), l)
}

/// Colatitude step of mw -> mwss: interpolate the periodic extension onto
/// `theta_t = pi t / L` and keep the physical rings `0..=L`
fn mw_to_mwss_theta(f: &Array2<Complex64>, l: usize, spin: i64) -> Array2<Complex64> {
    let nphi = 2 * l - 1;
    let next = 2 * l - 1;
    let f_ext = periodic_extension_mw(f, l, spin);

    let mut planner = FftPlanner::<f64>::new();
    let fwd = planner.plan_fft_forward(next);
    let inv = planner.plan_fft_inverse(2 * l);

    let kmin = -(l as i64 - 1);
    let mut out = Array2::<Complex64>::zeros((l + 1, nphi));
    let mut buf = vec![Complex64::new(0.0, 0.0); next];
    for p in 0..nphi {
        for (b, v) in buf.iter_mut().zip(f_ext.column(p).iter()) {
            *b = *v;
        }
        fwd.process(&mut buf);
        let mut coeffs = bins_to_coeffs(&buf, kmin, 2 * l - 1);
        for (i, c) in coeffs.iter_mut().enumerate() {
            // the mw rings are offset by pi/(2L-1) from the periodic grid
            let k = kmin + i as i64;
            let shift =
                Complex64::from_polar(1.0, -(k as f64) * std::f64::consts::PI / next as f64);
            *c = *c * shift / next as f64;
        }
        let mut resampled = coeffs_to_bins(&coeffs, kmin, 2 * l);
        inv.process(&mut resampled);
        for t in 0..=l {
            out[[t, p]] = resampled[t];
        }
    }
    out
}

/// Longitude step of mw -> mwss: 2L-1 samples per ring to 2L
fn mw_to_mwss_phi(f: &Array2<Complex64>, l: usize) -> Array2<Complex64> {
    let nphi_in = 2 * l - 1;
    let nphi_out = 2 * l;
    let mut planner = FftPlanner::<f64>::new();
    let fwd = planner.plan_fft_forward(nphi_in);
    let inv = planner.plan_fft_inverse(nphi_out);

    let kmin = -(l as i64 - 1);
    let mut out = Array2::<Complex64>::zeros((f.nrows(), nphi_out));
    let mut buf = vec![Complex64::new(0.0, 0.0); nphi_in];
    for t in 0..f.nrows() {
        for (b, v) in buf.iter_mut().zip(f.row(t).iter()) {
            *b = *v;
        }
        fwd.process(&mut buf);
        let coeffs: Vec<Complex64> = bins_to_coeffs(&buf, kmin, 2 * l - 1)
            .iter()
            .map(|c| *c / nphi_in as f64)
            .collect();
        let mut resampled = coeffs_to_bins(&coeffs, kmin, nphi_out);
        inv.process(&mut resampled);
        for (p, v) in resampled.iter().enumerate() {
            out[[t, p]] = *v;
        }
    }
    out
}

/// Double the colatitude resolution of an mwss-sampled signal:
/// `(L+1, nphi)` to `(2L+1, nphi)` via spatial periodic extension and
/// Fourier zero-padding
pub(crate) fn upsample_by_two_mwss(
    f: &Array2<Complex64>,
    l: usize,
    spin: i64,
) -> Array2<Complex64> {
    let nphi = f.ncols();
    let next = 2 * l;
    let sign = if spin.rem_euclid(2) == 1 { -1.0 } else { 1.0 };

    // spatial extension: reflection through the poles is a longitude
    // rotation by pi, an integer shift of nphi/2 on the symmetric grid
    let mut f_ext = Array2::<Complex64>::zeros((next, nphi));
    f_ext.slice_mut(ndarray::s![..l + 1, ..]).assign(f);
    for t in l + 1..next {
        let src = 2 * l - t;
        for p in 0..nphi {
            f_ext[[t, p]] = sign * f[[src, (p + nphi / 2) % nphi]];
        }
    }

    let mut planner = FftPlanner::<f64>::new();
    let fwd = planner.plan_fft_forward(next);
    let inv = planner.plan_fft_inverse(2 * next);

    let kmin = -(l as i64);
    let mut out = Array2::<Complex64>::zeros((2 * l + 1, nphi));
    let mut buf = vec![Complex64::new(0.0, 0.0); next];
    for p in 0..nphi {
        for (b, v) in buf.iter_mut().zip(f_ext.column(p).iter()) {
            *b = *v;
        }
        fwd.process(&mut buf);
        let coeffs: Vec<Complex64> = bins_to_coeffs(&buf, kmin, next)
            .iter()
            .map(|c| *c / next as f64)
            .collect();
        let mut upsampled = coeffs_to_bins(&coeffs, kmin, 2 * next);
        inv.process(&mut upsampled);
        for t in 0..=2 * l {
            out[[t, p]] = upsampled[t];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant functions are bandlimited at L = 1 and must regrid exactly
    #[test]
    fn test_constant_signal_regrids_exactly() {
        let l = 6;
        let f = Array2::from_elem((l, 2 * l - 1), Complex64::new(2.5, -1.0));
        let g = mw_to_mwss(&f, l, 0);
        assert_eq!(g.dim(), (l + 1, 2 * l));
        for v in g.iter() {
            assert!((v - Complex64::new(2.5, -1.0)).norm() < 1e-12);
        }
        let up = upsample_by_two_mwss(&g, l, 0);
        assert_eq!(up.dim(), (2 * l + 1, 2 * l));
        for v in up.iter() {
            assert!((v - Complex64::new(2.5, -1.0)).norm() < 1e-12);
        }
    }

    /// A pure spherical harmonic regrids onto the target grid's exact values
    #[test]
    fn test_regrid_matches_direct_synthesis() {
        use crate::precompute::{spin_kernel, Direction};
        use crate::sampling::{flm_shape, Sampling};
        use crate::spherical::inverse_with_kernel;

        let l = 8;
        let mut flm = Array2::<Complex64>::zeros(flm_shape(l));
        flm[[2, l - 1 + 1]] = Complex64::new(1.0, 0.5);
        flm[[2, l - 1 - 1]] = Complex64::new(-0.25, 0.7);
        flm[[5, l - 1 - 3]] = Complex64::new(0.0, -2.0);

        let k_mw = spin_kernel(l, 0, Sampling::Mw, false, Direction::Inverse);
        let k_mwss = spin_kernel(l, 0, Sampling::Mwss, false, Direction::Inverse);
        let f_mw = inverse_with_kernel(&flm, l, 0, Sampling::Mw, false, &k_mw).unwrap();
        let f_mwss = inverse_with_kernel(&flm, l, 0, Sampling::Mwss, false, &k_mwss).unwrap();

        let regridded = mw_to_mwss(&f_mw, l, 0);
        assert_eq!(regridded.dim(), f_mwss.dim());
        for (a, b) in regridded.iter().zip(f_mwss.iter()) {
            assert!((a - b).norm() < 1e-12, "{a} vs {b}");
        }
    }
}
