//! Test utilities and helpers for unit tests
//!
//! This module provides reusable fixtures:
//! - HSP builders on the plus strand and with explicit frames
//! - Stock Karlin blocks and score blocks
//! - Linking parameters with both gap models enabled
//! - A relative-error assertion for E-value comparisons

use hsplink::hsp::{BlastSeg, Hsp};
use hsplink::params::{HitSavingParams, LinkHspParams};
use hsplink::query_info::ScoreBlk;
use hsplink::stats::KarlinBlk;

/// Stock ungapped protein Karlin parameters (BLOSUM62 range).
pub fn protein_kbp() -> KarlinBlk {
    KarlinBlk::new(0.267, 0.041, 0.14)
}

/// Score block with a single protein context and no gapped statistics.
pub fn protein_score_blk() -> ScoreBlk {
    ScoreBlk::new(vec![protein_kbp()], vec![])
}

/// Score block whose gapped parameters differ from the ungapped ones, so
/// a test can tell which set a pass actually read.
pub fn dual_score_blk() -> ScoreBlk {
    ScoreBlk::new(vec![protein_kbp()], vec![KarlinBlk::new(0.3, 0.05, 0.2)])
}

/// Plus-strand HSP on context 0.
pub fn make_hsp(score: i32, q_off: i32, q_end: i32, s_off: i32, s_end: i32) -> Hsp {
    Hsp::new(
        score,
        BlastSeg::new(1, q_off, q_end),
        BlastSeg::new(1, s_off, s_end),
        0,
    )
}

/// HSP with explicit query and subject frames, for strand-grouping tests.
pub fn make_framed_hsp(
    score: i32,
    q_frame: i16,
    q_off: i32,
    q_end: i32,
    s_frame: i16,
    s_off: i32,
    s_end: i32,
) -> Hsp {
    Hsp::new(
        score,
        BlastSeg::new(q_frame, q_off, q_end),
        BlastSeg::new(s_frame, s_off, s_end),
        0,
    )
}

/// Ungapped linking parameters with token cutoffs so both gap models run.
pub fn permissive_params() -> LinkHspParams {
    let mut params = LinkHspParams::new(false);
    params.cutoff_small_gap = 1;
    params.cutoff_big_gap = 5;
    params
}

pub fn hit_params(link_hsp_params: LinkHspParams) -> HitSavingParams {
    HitSavingParams::new(link_hsp_params)
}

/// Assert two E-values agree to a relative tolerance.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    let relative_error = if expected == 0.0 {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    };
    assert!(
        relative_error < tolerance,
        "{}: got {}, expected {}, relative error {}",
        what,
        actual,
        expected,
        relative_error
    );
}
