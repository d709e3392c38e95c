//! Quadrature weights for exact integration of bandlimited signals
//!
//! All weights returned here are theta-only: they integrate
//! `h(theta) sin(theta)` over `[0, pi]` exactly when `h` is a trigonometric
//! polynomial within the scheme's bandlimit. Callers multiply by
//! `2 pi / nphi` to fold in the longitude quadrature.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::{theta, Sampling};

/// Exact integral over the colatitude: `int_0^pi e^{i k theta} sin(theta) dtheta`
pub(crate) fn sin_integral(k: i64) -> Complex64 {
    match k {
        1 => Complex64::new(0.0, PI / 2.0),
        -1 => Complex64::new(0.0, -PI / 2.0),
        k if k % 2 == 0 => Complex64::new(2.0 / (1.0 - (k * k) as f64), 0.0),
        _ => Complex64::new(0.0, 0.0),
    }
}

/// Theta-only quadrature weights for the physical rings of `(L, sampling)`
pub fn theta_weights(l: usize, sampling: Sampling) -> Vec<f64> {
    match sampling {
        Sampling::Mw => weights_mw(l),
        Sampling::Mwss => weights_mwss(l),
        Sampling::Dh => weights_dh(l),
    }
}

/// Driscoll-Healy weights, closed form:
/// `w(theta) = (2/L) sin(theta) sum_{k<L} sin((2k+1) theta) / (2k+1)`
fn weights_dh(l: usize) -> Vec<f64> {
    (0..2 * l)
        .map(|t| {
            let th = theta(t, l, Sampling::Dh);
            let mut sum = 0.0;
            for k in 0..l {
                let odd = (2 * k + 1) as f64;
                sum += (odd * th).sin() / odd;
            }
            2.0 / l as f64 * th.sin() * sum
        })
        .collect()
}

/// McEwen-Wiaux weights: match the exact Fourier-space integrals on the
/// periodic theta extension (2L-1 samples), then fold the extended rings
/// back onto their reflected physical rings.
fn weights_mw(l: usize) -> Vec<f64> {
    let next = 2 * l - 1;
    let v = extension_weights(next, |t| PI * (2 * t + 1) as f64 / next as f64, l as i64 - 1);
    let mut q = v[..l].to_vec();
    for t in l..next {
        q[2 * l - 2 - t] += v[t];
    }
    q
}

/// Symmetric-grid variant: 2L extension samples at `theta_t = pi t / L`,
/// poles unpaired, interior extended rings folded onto `2L - t`.
fn weights_mwss(l: usize) -> Vec<f64> {
    let next = 2 * l;
    let v = extension_weights(next, |t| PI * t as f64 / l as f64, l as i64 - 1);
    let mut q = v[..l + 1].to_vec();
    for t in l + 1..next {
        q[2 * l - t] += v[t];
    }
    q
}

/// Weights on the full periodic extension:
/// `v_t = (1/next) sum_{|k| <= kmax} w(k) e^{-i k theta_t}`
///
/// By construction `sum_t v_t e^{i k theta_t}` reproduces the exact
/// integral for every `|k| <= kmax`, since `2 kmax < next` rules out
/// aliasing between matched frequencies.
fn extension_weights(next: usize, theta_of: impl Fn(usize) -> f64, kmax: i64) -> Vec<f64> {
    (0..next)
        .map(|t| {
            let th = theta_of(t);
            let mut acc = Complex64::new(0.0, 0.0);
            for k in -kmax..=kmax {
                let phase = Complex64::from_polar(1.0, -(k as f64) * th);
                acc += sin_integral(k) * phase;
            }
            acc.re / next as f64
        })
        .collect()
}
