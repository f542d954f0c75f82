//! Precomputed log-probability quality tables.
//!
//! The reference crate builds its k-mer code tables once per chromosome
//! and memoizes narrow-width lookup vectors (`kmer_codec::build_codes`).
//! Here the equivalent one-time cost is a handful of `(PHREDMAX+1)^2`
//! matrices of `f64`; they depend on `ln`/`exp`, which are not `const fn`
//! on stable Rust, so they are built lazily into a `OnceLock` instead of
//! at compile time.

use std::sync::OnceLock;

/// Maximum representable PHRED score.
pub const PHREDMAX: u8 = 46;

/// Clamp a raw PHRED score into `[0, PHREDMAX]`.
#[inline(always)]
pub fn clamp_phred(q: u8) -> u8 {
    q.min(PHREDMAX)
}

/// PHRED -> error probability, `10^(-q/10)`.
#[inline]
pub fn phred_to_p(q: u8) -> f64 {
    10f64.powf(-(clamp_phred(q) as f64) / 10.0)
}

/// `log(0.25)`, the one-sided "no information" log-probability.
pub fn qual_nn() -> f64 {
    0.25f64.ln()
}

type Matrix = Vec<Vec<f64>>;
type Row = Vec<f64>;

fn build_matrix(formula: impl Fn(f64, f64) -> f64) -> Matrix {
    let n = PHREDMAX as usize + 1;
    (0..n)
        .map(|i| {
            let p = phred_to_p(i as u8);
            (0..n)
                .map(|j| {
                    let q = phred_to_p(j as u8);
                    formula(p, q).ln()
                })
                .collect()
        })
        .collect()
}

fn build_row(formula: impl Fn(f64) -> f64) -> Row {
    (0..=PHREDMAX).map(|i| formula(phred_to_p(i))).collect()
}

fn match_formula(p: f64, q: f64) -> f64 {
    (1.0 - p) * (1.0 - q) + p * q / 3.0
}

fn mismatch_formula(p: f64, q: f64) -> f64 {
    (1.0 - p) * q / 3.0 + (1.0 - q) * p / 3.0 + 2.0 * p * q / 9.0
}

/// `log(1 - 10^(-q/10))`, with the `p == 1` (q == 0) case pinned to -2
/// rather than `-inf`, matching the original table generator's special
/// case for a PHRED-0 "certainly wrong" base.
fn score_formula(p: f64) -> f64 {
    if p == 1.0 {
        -2.0
    } else {
        (1.0 - p).ln()
    }
}

fn score_err_formula(p: f64) -> f64 {
    p.ln()
}

/// `log(p/2 + 0.25)`, used when only one side of a comparison carries a
/// PHRED (the other is N); pinned to -2 at `p == 1` like `score_formula`.
fn nmatch_formula(p: f64) -> f64 {
    if p == 1.0 {
        -2.0
    } else {
        (p / 2.0 + 0.25).ln()
    }
}

macro_rules! lazy_table {
    ($name:ident, $ty:ty, $init:expr) => {
        pub fn $name() -> &'static $ty {
            static CELL: OnceLock<$ty> = OnceLock::new();
            CELL.get_or_init(|| $init)
        }
    };
}

lazy_table!(qual_match, Matrix, build_matrix(match_formula));
lazy_table!(qual_mismatch, Matrix, build_matrix(mismatch_formula));
lazy_table!(qual_score, Row, build_row(score_formula));
lazy_table!(qual_score_err, Row, build_row(score_err_formula));
lazy_table!(qual_nmatch, Row, build_row(nmatch_formula));

// PEAR-specific tables: the original ports qual_match/qual_mismatch
// verbatim for PEAR, so PEAR reuses `qual_match`/`qual_mismatch` above
// (the PANDAseq source literally shares `qual_match`/`qual_mismatch`
// between simple-bayes and PEAR; only the random-base handling differs).

fn uparse_match_formula(p: f64, q: f64) -> f64 {
    match_formula(p, q)
}

fn uparse_mismatch_formula(p: f64, q: f64) -> f64 {
    mismatch_formula(p, q)
}

lazy_table!(qual_match_uparse, Matrix, build_matrix(uparse_match_formula));
lazy_table!(
    qual_mismatch_uparse,
    Matrix,
    build_matrix(uparse_mismatch_formula)
);

/// RDP-MLE's mismatch-only specialized table: identical formula to the
/// simple-Bayes mismatch table in the original source (`prob.h`'s
/// `qual_mismatch_rdp_mle` is generated by the same `mismatch()` formula
/// as `qual_mismatch`), kept as a separate table purely so algorithm
/// variants remain independently tunable without cross-coupling.
lazy_table!(qual_mismatch_rdp_mle, Matrix, build_matrix(mismatch_formula));

/// Compare two quality bases directly: the log-probability that `a`
/// matches `b`, taking N-handling into account the way
/// `panda_quality_compare`'s `qualscore` helper does in `assembler.c`.
pub fn compare(a_nt: crate::assemble::nt::Nt, a_q: u8, b_nt: crate::assemble::nt::Nt, b_q: u8) -> f64 {
    use crate::assemble::nt::is_n;
    if is_n(a_nt) {
        if is_n(b_nt) {
            return qual_nn();
        }
        return qual_nmatch()[clamp_phred(b_q) as usize];
    }
    if is_n(b_nt) {
        return qual_nmatch()[clamp_phred(a_q) as usize];
    }
    let matched = a_nt & b_nt != 0;
    let table = if matched { qual_match() } else { qual_mismatch() };
    table[clamp_phred(a_q) as usize][clamp_phred(b_q) as usize]
}

/// `log(1 - exp(-p))` via the Mächler trick, for `p >= 0`.
pub fn log1mexp(p: f64) -> f64 {
    const LN2: f64 = std::f64::consts::LN_2;
    if p > LN2 {
        (-p.exp()).ln_1p()
    } else {
        (-(-p).exp_m1()).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_phred_caps_at_phredmax() {
        assert_eq!(clamp_phred(200), PHREDMAX);
        assert_eq!(clamp_phred(0), 0);
    }

    #[test]
    fn qual_match_is_never_nan_and_non_positive() {
        for i in 0..=PHREDMAX {
            for j in 0..=PHREDMAX {
                let v = qual_match()[i as usize][j as usize];
                assert!(!v.is_nan());
                assert!(v <= 0.0);
            }
        }
    }

    #[test]
    fn high_quality_match_is_more_certain_than_low_quality_match() {
        let good = qual_match()[40][40];
        let bad = qual_match()[5][5];
        assert!(good > bad, "higher PHRED match should be less negative");
    }

    #[test]
    fn log1mexp_matches_direct_computation_away_from_zero() {
        for p in [0.01, 0.1, 0.5, 1.0, 2.0, 5.0] {
            let via_trick = log1mexp(p);
            let direct = (1.0 - (-p).exp()).ln();
            assert!((via_trick - direct).abs() < 1e-9, "p={p}");
        }
    }

    #[test]
    fn qual_score_zero_is_pinned_to_negative_two() {
        assert_eq!(qual_score()[0], -2.0);
    }
}
