//! Wigner-d functions via three-term recurrence in the degree
//!
//! Computes tables of `d^l_{m,n}(theta)` for all degrees below a bandlimit,
//! seeded at the lowest admissible degree `l0 = max(|m|, |n|)` with
//! closed-form edge values evaluated in log space, then advanced with the
//! standard degree recurrence. The recurrence coefficients are independent
//! of theta, so each `(m, n)` pair walks every ring in lockstep.
//!
//! Double precision holds the recurrence stable well past the bandlimits
//! this crate targets; accuracy degrades gradually for bandlimits in the
//! several-thousand range, which callers should treat as the practical
//! ceiling rather than a detectable error condition.

use ndarray::Array3;

/// Natural log of k! for k = 0..=up_to
pub(crate) fn ln_factorials(up_to: usize) -> Vec<f64> {
    let mut table = vec![0.0; up_to + 1];
    for k in 2..=up_to {
        table[k] = table[k - 1] + (k as f64).ln();
    }
    table
}

/// Closed-form `d^j_{m,n}(theta)` at the edge degree `j = max(|m|, |n|)`
///
/// All four edge cases reduce to
/// `+- sqrt(C(2j, a)) cos^p(theta/2) sin^q(theta/2)` with `p + q = 2j`;
/// the product is evaluated in log space to avoid underflow at high degree.
fn edge_value(theta: f64, m: i64, n: i64, ln_fact: &[f64]) -> f64 {
    let j = m.abs().max(n.abs());
    if j == 0 {
        return 1.0;
    }
    let (p, q, choose, negative) = if n == j {
        (j + m, j - m, j + m, false)
    } else if n == -j {
        (j - m, j + m, j - m, (j + m) % 2 != 0)
    } else if m == j {
        (j + n, j - n, j + n, (j - n) % 2 != 0)
    } else {
        // m == -j
        (j - n, j + n, j - n, false)
    };

    let cos_half = (0.5 * theta).cos();
    let sin_half = (0.5 * theta).sin();
    // 0^0 = 1 at the poles
    if p > 0 && cos_half == 0.0 {
        return 0.0;
    }
    if q > 0 && sin_half == 0.0 {
        return 0.0;
    }
    let mut ln = 0.5
        * (ln_fact[(2 * j) as usize]
            - ln_fact[choose as usize]
            - ln_fact[(2 * j - choose) as usize]);
    if p > 0 {
        ln += p as f64 * cos_half.ln();
    }
    if q > 0 {
        ln += q as f64 * sin_half.ln();
    }
    let magnitude = ln.exp();
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Table of `d^l_{m,n}(theta)` for all `l < l_max`, `|m| < l_max`
///
/// # Arguments
/// * `thetas` - Colatitudes in `[0, pi]`
/// * `l_max` - Harmonic bandlimit; degrees `l < l_max` are produced
/// * `n` - Fixed second order, `|n| < l_max`
///
/// # Returns
/// Array indexed `[theta, l, l_max - 1 + m]`. Entries with
/// `l < max(|m|, |n|)` are zero, so the triangular support is built in.
pub fn dl_table(thetas: &[f64], l_max: usize, n: i64) -> Array3<f64> {
    let nth = thetas.len();
    let mdim = 2 * l_max - 1;
    let mut out = Array3::<f64>::zeros((nth, l_max, mdim));
    let ln_fact = ln_factorials(2 * l_max);
    let cos_beta: Vec<f64> = thetas.iter().map(|t| t.cos()).collect();

    let mut d_prev = vec![0.0; nth];
    let mut d_prev2 = vec![0.0; nth];

    for mi in 0..mdim {
        let m = mi as i64 - (l_max as i64 - 1);
        let l0 = m.abs().max(n.abs());
        if l0 >= l_max as i64 {
            continue;
        }

        for (t, &th) in thetas.iter().enumerate() {
            d_prev[t] = edge_value(th, m, n, &ln_fact);
            d_prev2[t] = 0.0;
            out[[t, l0 as usize, mi]] = d_prev[t];
        }

        for l in (l0 + 1)..l_max as i64 {
            let lf = l as f64;
            let mf = m as f64;
            let nf = n as f64;
            let w = ((lf * lf - mf * mf) * (lf * lf - nf * nf)).sqrt();
            let a = lf * (2.0 * lf - 1.0) / w;
            let b = if l > 1 { mf * nf / (lf * (lf - 1.0)) } else { 0.0 };
            // the d^{l-2} term vanishes at l = l0 + 1 where its own weight
            // sqrt(((l-1)^2 - m^2)((l-1)^2 - n^2)) is zero
            let c = if l == l0 + 1 {
                0.0
            } else {
                let lp = lf - 1.0;
                let wp = ((lp * lp - mf * mf) * (lp * lp - nf * nf)).sqrt();
                lf * wp / (lp * w)
            };
            for t in 0..nth {
                let d = a * (cos_beta[t] - b) * d_prev[t] - c * d_prev2[t];
                d_prev2[t] = d_prev[t];
                d_prev[t] = d;
                out[[t, l as usize, mi]] = d;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const THETAS: [f64; 4] = [0.3, 1.2, 2.5, std::f64::consts::PI];

    fn table(l_max: usize, n: i64) -> Array3<f64> {
        dl_table(&THETAS, l_max, n)
    }

    fn entry(dl: &Array3<f64>, t: usize, l: usize, m: i64, l_max: usize) -> f64 {
        dl[[t, l, (l_max as i64 - 1 + m) as usize]]
    }

    #[test]
    fn test_degree_one_closed_forms() {
        let l_max = 4;
        let d0 = table(l_max, 0);
        let dp = table(l_max, 1);
        let dm = table(l_max, -1);
        for (t, &th) in THETAS.iter().enumerate() {
            let (c, s) = (th.cos(), th.sin());
            let r2 = 2.0f64.sqrt();
            assert!((entry(&d0, t, 1, 0, l_max) - c).abs() < 1e-14);
            assert!((entry(&d0, t, 1, 1, l_max) + s / r2).abs() < 1e-14);
            assert!((entry(&d0, t, 1, -1, l_max) - s / r2).abs() < 1e-14);
            assert!((entry(&dp, t, 1, 1, l_max) - (1.0 + c) / 2.0).abs() < 1e-14);
            assert!((entry(&dp, t, 1, -1, l_max) - (1.0 - c) / 2.0).abs() < 1e-14);
            assert!((entry(&dp, t, 1, 0, l_max) - s / r2).abs() < 1e-14);
            assert!((entry(&dm, t, 1, 0, l_max) + s / r2).abs() < 1e-14);
            assert!((entry(&dm, t, 1, 1, l_max) - (1.0 - c) / 2.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_degree_two_closed_forms() {
        let l_max = 4;
        let d0 = table(l_max, 0);
        let dp = table(l_max, 1);
        let d2 = table(l_max, 2);
        for (t, &th) in THETAS.iter().enumerate() {
            let (c, s) = (th.cos(), th.sin());
            assert!((entry(&d0, t, 2, 0, l_max) - (3.0 * c * c - 1.0) / 2.0).abs() < 1e-14);
            assert!(
                (entry(&d0, t, 2, 1, l_max) + (1.5f64).sqrt() * s * c).abs() < 1e-14
            );
            assert!(
                (entry(&d0, t, 2, 2, l_max) - (3.0f64 / 8.0).sqrt() * s * s).abs() < 1e-14
            );
            assert!(
                (entry(&dp, t, 2, 1, l_max) - (1.0 + c) / 2.0 * (2.0 * c - 1.0)).abs()
                    < 1e-14
            );
            assert!((entry(&d2, t, 2, 2, l_max) - ((1.0 + c) / 2.0).powi(2)).abs() < 1e-14);
            // d^2_{1,2} = sin(theta) (1 + cos(theta)) / 2 = 2 cos^3(theta/2) sin(theta/2)
            assert!((entry(&d2, t, 2, 1, l_max) - s * (1.0 + c) / 2.0).abs() < 1e-14);
            assert!((entry(&d2, t, 2, 1, l_max)
                - 2.0 * (0.5 * th).cos().powi(3) * (0.5 * th).sin())
            .abs()
                < 1e-14);
        }
    }

    #[test]
    fn test_zonal_matches_legendre() {
        // d^l_{0,0}(theta) = P_l(cos theta)
        let l_max = 6;
        let d0 = table(l_max, 0);
        for (t, &th) in THETAS.iter().enumerate() {
            let x = th.cos();
            let p3 = (5.0 * x * x * x - 3.0 * x) / 2.0;
            let p4 = ((35.0 * x * x - 30.0) * x * x + 3.0) / 8.0;
            let p5 = ((63.0 * x * x - 70.0) * x * x + 15.0) * x / 8.0;
            assert!((entry(&d0, t, 3, 0, l_max) - p3).abs() < 1e-13);
            assert!((entry(&d0, t, 4, 0, l_max) - p4).abs() < 1e-13);
            assert!((entry(&d0, t, 5, 0, l_max) - p5).abs() < 1e-13);
        }
    }

    #[test]
    fn test_index_swap_symmetry() {
        // d^l_{m,n} = (-1)^{m-n} d^l_{n,m}
        let l_max = 8;
        for n in [-2i64, 0, 3] {
            let dn = table(l_max, n);
            for m in -(l_max as i64 - 1)..l_max as i64 {
                let dm = table(l_max, m);
                for l in 0..l_max {
                    if (l as i64) < m.abs().max(n.abs()) {
                        continue;
                    }
                    for t in 0..THETAS.len() {
                        let sign = if (m - n).rem_euclid(2) == 0 { 1.0 } else { -1.0 };
                        let lhs = entry(&dn, t, l, m, l_max);
                        let rhs = sign * entry(&dm, t, l, n, l_max);
                        assert!(
                            (lhs - rhs).abs() < 1e-12,
                            "l={l} m={m} n={n} t={t}: {lhs} vs {rhs}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_triangular_support_zeroed() {
        let l_max = 5;
        let dl = table(l_max, 2);
        for t in 0..THETAS.len() {
            for l in 0..2 {
                for mi in 0..2 * l_max - 1 {
                    assert_eq!(dl[[t, l, mi]], 0.0);
                }
            }
            // |m| > l also zero
            assert_eq!(entry(&dl, t, 2, 3, l_max), 0.0);
            assert_eq!(entry(&dl, t, 3, -4, l_max), 0.0);
        }
    }

    #[test]
    fn test_orthogonality_under_quadrature() {
        // int d^l_{m,n} d^{l'}_{m,n} sin theta dtheta = 2/(2l+1) delta_{l l'}
        use crate::sampling::{quadrature, thetas, Sampling};
        let l_max = 8;
        let th = thetas(l_max, Sampling::Dh);
        let w = quadrature::theta_weights(l_max, Sampling::Dh);
        let dl = dl_table(&th, l_max, 1);
        for l in 1..l_max {
            for lp in 1..l_max {
                for m in [-1i64, 0, 2] {
                    if m.abs() > l as i64 || m.abs() > lp as i64 {
                        continue;
                    }
                    let mi = (l_max as i64 - 1 + m) as usize;
                    let got: f64 = (0..th.len())
                        .map(|t| w[t] * dl[[t, l, mi]] * dl[[t, lp, mi]])
                        .sum();
                    let want = if l == lp { 2.0 / (2.0 * l as f64 + 1.0) } else { 0.0 };
                    assert!(
                        (got - want).abs() < 1e-12,
                        "l={l} lp={lp} m={m}: {got} vs {want}"
                    );
                }
            }
        }
    }
}
