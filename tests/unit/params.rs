//! Unit tests for params.rs
//!
//! Cutoff derivation is unit-tested in src; these runs feed the derived
//! parameters straight into the public linker and check which gap model
//! the chains actually come out under.

use hsplink::hsp::{HspList, OrderingMethod};
use hsplink::link::blast_link_hsps;
use hsplink::params::{calculate_link_hsp_cutoffs, HitSavingParams, LinkHspParams};
use hsplink::query_info::{BlastProgram, QueryInfo, SubjectBlk};

use super::helpers::{make_hsp, protein_score_blk};

#[test]
fn test_derived_cutoffs_let_close_pairs_use_small_gaps() {
    let query_info = QueryInfo::single(300, 300_000, 0);
    let sbp = protein_score_blk();
    let mut params = LinkHspParams::new(false);
    calculate_link_hsp_cutoffs(
        BlastProgram::Blastp,
        &query_info,
        &sbp,
        &mut params,
        0,
        100_000_000,
        1000,
    );
    assert!(params.cutoff_small_gap > 0);
    assert!(params.cutoff_big_gap > params.cutoff_small_gap);
    assert!(!params.ignore_small_gaps());

    // Two strong HSPs a few residues apart, inside the small-gap window
    let mut list = HspList::new(vec![
        make_hsp(80, 0, 60, 0, 60),
        make_hsp(75, 70, 130, 70, 130),
    ]);
    blast_link_hsps(
        BlastProgram::Blastp,
        &mut list,
        &query_info,
        &SubjectBlk::with_length(1000),
        &sbp,
        &HitSavingParams::new(params),
        false,
    )
    .unwrap();

    for h in &list.hsps {
        assert_eq!(h.num, 2);
        assert!(h.linked_set);
        assert_eq!(h.ordering_method, Some(OrderingMethod::SmallGap));
    }
    assert_eq!(list.hsps[0].sum_score, 155);
}

#[test]
fn test_small_search_space_forces_large_gap_chains() {
    let query_info = QueryInfo::single(50, 40_000, 0);
    let sbp = protein_score_blk();
    let mut params = LinkHspParams::new(false);
    calculate_link_hsp_cutoffs(
        BlastProgram::Blastp,
        &query_info,
        &sbp,
        &mut params,
        0,
        100,
        100,
    );
    // The small search space zeroes both the small-gap cutoff and the
    // prior, and the zero cutoff doubles as the disable flag
    assert_eq!(params.cutoff_small_gap, 0);
    assert_eq!(params.gap_prob, 0.0);
    assert!(params.ignore_small_gaps());
    assert!(params.cutoff_big_gap > 0);

    let mut list = HspList::new(vec![
        make_hsp(80, 0, 20, 0, 20),
        make_hsp(75, 25, 45, 25, 45),
    ]);
    blast_link_hsps(
        BlastProgram::Blastp,
        &mut list,
        &query_info,
        &SubjectBlk::with_length(100),
        &sbp,
        &HitSavingParams::new(params),
        false,
    )
    .unwrap();

    // Adjacent or not, every chain reports the large-gap model
    for h in &list.hsps {
        assert_eq!(h.num, 2);
        assert_eq!(h.ordering_method, Some(OrderingMethod::LargeGap));
    }
}

#[test]
fn test_scale_factor_multiplies_both_cutoffs() {
    let query_info = QueryInfo::single(300, 0, 0);

    let mut plain = LinkHspParams::new(false);
    calculate_link_hsp_cutoffs(
        BlastProgram::Blastp,
        &query_info,
        &protein_score_blk(),
        &mut plain,
        0,
        100_000_000,
        1000,
    );

    let mut scaled_sbp = protein_score_blk();
    scaled_sbp.scale_factor = 32.0;
    let mut scaled = LinkHspParams::new(false);
    calculate_link_hsp_cutoffs(
        BlastProgram::Blastp,
        &query_info,
        &scaled_sbp,
        &mut scaled,
        0,
        100_000_000,
        1000,
    );

    assert_eq!(scaled.cutoff_small_gap, 32 * plain.cutoff_small_gap);
    assert_eq!(scaled.cutoff_big_gap, 32 * plain.cutoff_big_gap);
}
