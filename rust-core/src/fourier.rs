//! FFT plumbing shared by the transform engines
//!
//! Thin helpers over rustfft/realfft that translate between coefficients
//! ordered by signed frequency and DFT bin order, and run transforms along
//! either axis of an ndarray.

use std::sync::Arc;

use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rustfft::Fft;

/// DFT bin holding signed frequency `k` for length `n`
pub(crate) fn bin_of(k: i64, n: usize) -> usize {
    k.rem_euclid(n as i64) as usize
}

/// Signed frequency held by DFT bin `j` for length `n`
pub(crate) fn freq_of(j: usize, n: usize) -> i64 {
    if j <= (n - 1) / 2 {
        j as i64
    } else {
        j as i64 - n as i64
    }
}

/// Scatter coefficients for frequencies `kmin..` into a zeroed bin-order
/// spectrum of length `nbins`
pub(crate) fn coeffs_to_bins(coeffs: &[Complex64], kmin: i64, nbins: usize) -> Vec<Complex64> {
    let mut bins = vec![Complex64::new(0.0, 0.0); nbins];
    for (i, &c) in coeffs.iter().enumerate() {
        bins[bin_of(kmin + i as i64, nbins)] = c;
    }
    bins
}

/// Gather `count` coefficients for frequencies `kmin..` out of a bin-order
/// spectrum
pub(crate) fn bins_to_coeffs(bins: &[Complex64], kmin: i64, count: usize) -> Vec<Complex64> {
    (0..count)
        .map(|i| bins[bin_of(kmin + i as i64, bins.len())])
        .collect()
}

/// Run an FFT plan over every lane along `axis`, in place
///
/// Lanes are staged through a contiguous buffer so the same code path covers
/// rows and columns.
pub(crate) fn transform_lanes(a: &mut Array2<Complex64>, axis: Axis, plan: &Arc<dyn Fft<f64>>) {
    let mut buf = vec![Complex64::new(0.0, 0.0); plan.len()];
    for mut lane in a.lanes_mut(axis) {
        for (b, v) in buf.iter_mut().zip(lane.iter()) {
            *b = *v;
        }
        plan.process(&mut buf);
        for (v, b) in lane.iter_mut().zip(buf.iter()) {
            *v = *b;
        }
    }
}
