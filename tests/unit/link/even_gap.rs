//! Unit tests for link/even_gap.rs
//!
//! The engine's own tests pin the dynamic program; these go through
//! `blast_link_hsps` and check the surface a caller sees: the permuted
//! arena layout, chain bookkeeping and the statistics actually reported.

use hsplink::hsp::{Hsp, HspList, OrderingMethod};
use hsplink::link::blast_link_hsps;
use hsplink::query_info::{BlastProgram, QueryInfo, SubjectBlk};
use hsplink::stats::karlin_stoe_simple;
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use super::super::helpers::{
    assert_close, dual_score_blk, hit_params, make_framed_hsp, make_hsp, permissive_params,
    protein_kbp, protein_score_blk,
};

const SEARCHSP: i64 = 100_000;

fn link_protein(list: &mut HspList) {
    blast_link_hsps(
        BlastProgram::Blastp,
        list,
        &QueryInfo::single(600, SEARCHSP, 0),
        &SubjectBlk::with_length(1000),
        &protein_score_blk(),
        &hit_params(permissive_params()),
        false,
    )
    .unwrap();
}

/// Three HSPs that chain within the small-gap window.
fn chainable_trio() -> Vec<Hsp> {
    vec![
        make_hsp(60, 0, 30, 0, 30),
        make_hsp(55, 35, 65, 35, 65),
        make_hsp(50, 70, 100, 70, 100),
    ]
}

/// Two HSPs whose subject coordinates cross the trio and each other, so
/// they can never extend any chain.
fn crossing_pair() -> Vec<Hsp> {
    vec![
        make_hsp(45, 300, 330, 80, 110),
        make_hsp(40, 450, 480, 20, 50),
    ]
}

fn coordinate_multiset(hsps: &[Hsp]) -> FxHashMap<(i32, i32, i32), i32> {
    let mut counts = FxHashMap::default();
    for h in hsps {
        *counts.entry((h.score, h.query.offset, h.subject.offset)).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_linking_preserves_the_hsp_multiset() {
    let mut hsps = chainable_trio();
    hsps.extend(crossing_pair());
    hsps.push(make_framed_hsp(52, -1, 10, 40, 1, 600, 630));

    let before = coordinate_multiset(&hsps);
    let mut list = HspList::new(hsps);
    link_protein(&mut list);

    assert_eq!(coordinate_multiset(&list.hsps), before);
    assert_eq!(list.len(), 6);
}

#[test]
fn test_chains_come_back_contiguous_head_first() {
    let mut hsps = chainable_trio();
    hsps.extend(crossing_pair());
    let mut list = HspList::new(hsps);
    link_protein(&mut list);

    // One chain of three followed by the two leftovers as singletons
    let heads: Vec<usize> =
        (0..list.len()).filter(|&i| list.hsps[i].start_of_chain).collect();
    assert_eq!(heads, vec![0, 3, 4]);

    assert_eq!(list.hsps[0].num, 3);
    for member in &list.hsps[1..3] {
        assert_eq!(member.num, 3);
        assert!(member.linked_set);
        assert!(!member.start_of_chain);
        assert_eq!(member.evalue, list.hsps[0].evalue);
    }
    assert_eq!(list.hsps[3].query.offset, 300);
    assert_eq!(list.hsps[4].query.offset, 450);
    for single in &list.hsps[3..] {
        assert_eq!(single.num, 1);
        assert!(!single.linked_set);
    }

    // Members keep the query order inside the chain
    assert_eq!(list.hsps[0].query.offset, 0);
    assert_eq!(list.hsps[1].query.offset, 35);
    assert_eq!(list.hsps[2].query.offset, 70);
}

#[test]
fn test_chain_evalue_beats_each_singleton() {
    let mut list = HspList::new(chainable_trio());
    link_protein(&mut list);

    let kbp = protein_kbp();
    for h in &list.hsps {
        assert_eq!(h.num, 3);
        assert_eq!(h.ordering_method, Some(OrderingMethod::SmallGap));
        let alone = karlin_stoe_simple(h.score, &kbp, SEARCHSP);
        assert!(
            h.evalue < alone,
            "chain evalue {} should beat the singleton {}",
            h.evalue,
            alone
        );
    }
    assert_eq!(list.hsps[0].sum_score, 165);
}

#[test]
fn test_subject_frame_signs_never_mix() {
    let mut list = HspList::new(vec![
        make_framed_hsp(60, 1, 0, 30, 1, 0, 30),
        make_framed_hsp(55, 1, 35, 65, 1, 35, 65),
        make_framed_hsp(58, 1, 100, 130, -1, 200, 230),
        make_framed_hsp(53, 1, 135, 165, -1, 235, 265),
    ]);
    blast_link_hsps(
        BlastProgram::Tblastx,
        &mut list,
        &QueryInfo::single(600, SEARCHSP, 0),
        &SubjectBlk::with_length(3000),
        &protein_score_blk(),
        &hit_params(permissive_params()),
        false,
    )
    .unwrap();

    let mut chains = 0;
    let mut i = 0;
    while i < list.len() {
        let head = &list.hsps[i];
        assert!(head.start_of_chain);
        let span = head.num as usize;
        for member in &list.hsps[i..i + span] {
            assert_eq!(member.subject.strand(), head.subject.strand());
            assert_eq!(member.num, head.num);
        }
        chains += 1;
        i += span;
    }
    assert_eq!(chains, 2);
    for h in &list.hsps {
        assert_eq!(h.num, 2);
    }
}

#[test]
fn test_gapped_flag_selects_gapped_statistics() {
    let sbp = dual_score_blk();
    let query_info = QueryInfo::single(600, SEARCHSP, 0);
    let subject = SubjectBlk::with_length(1000);
    let params = hit_params(permissive_params());

    let mut ungapped = HspList::new(vec![make_hsp(60, 10, 40, 10, 40)]);
    blast_link_hsps(
        BlastProgram::Blastp,
        &mut ungapped,
        &query_info,
        &subject,
        &sbp,
        &params,
        false,
    )
    .unwrap();

    let mut gapped = HspList::new(vec![make_hsp(60, 10, 40, 10, 40)]);
    blast_link_hsps(
        BlastProgram::Blastp,
        &mut gapped,
        &query_info,
        &subject,
        &sbp,
        &params,
        true,
    )
    .unwrap();

    // Singleton E-value is searchsp * K * exp(-lambda * S), doubled by
    // the length-1 decay divisor of 0.5
    let space = SEARCHSP as f64;
    assert_close(
        ungapped.hsps[0].evalue,
        2.0 * space * 0.041 * (-0.267_f64 * 60.0).exp(),
        1e-9,
        "ungapped singleton evalue",
    );
    assert_close(
        gapped.hsps[0].evalue,
        2.0 * space * 0.05 * (-0.3_f64 * 60.0).exp(),
        1e-9,
        "gapped singleton evalue",
    );
}

#[test]
fn test_input_order_does_not_change_the_result() {
    let mut hsps = chainable_trio();
    hsps.push(make_hsp(45, 300, 330, 80, 110));

    let mut forward = HspList::new(hsps.clone());
    hsps.reverse();
    hsps.swap(1, 2);
    let mut shuffled = HspList::new(hsps);

    link_protein(&mut forward);
    link_protein(&mut shuffled);

    assert_eq!(forward.hsps, shuffled.hsps);
}
