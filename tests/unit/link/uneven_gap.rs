//! Unit tests for link/uneven_gap.rs
//!
//! Spliced linking through the public entry point, with real subject
//! sequences in ncbi4na coding so the consensus scan runs for real. The
//! mocked-scorer behaviors (window bounds, acceptance rule) are pinned by
//! the engine's own tests; these cover the full statistics path.

use hsplink::hsp::{HspList, OrderingMethod};
use hsplink::link::blast_link_hsps;
use hsplink::query_info::{
    BlastProgram, QueryInfo, SubjectBlk, NCBI4NA_A, NCBI4NA_C, NCBI4NA_G, NCBI4NA_T,
};
use hsplink::stats::karlin_stoe_simple;

use super::super::helpers::{
    assert_close, hit_params, make_framed_hsp, make_hsp, permissive_params, protein_kbp,
    protein_score_blk,
};

const SEARCHSP: i64 = 1_000_000;
const SUBJECT_LEN: i32 = 6000;

/// Subject filled with C plus `GT`/`AG` motifs planted at the given
/// donor and acceptor positions.
fn spliced_subject(junctions: &[(usize, usize)]) -> SubjectBlk {
    let mut seq = vec![NCBI4NA_C; SUBJECT_LEN as usize];
    for &(gt, ag) in junctions {
        seq[gt] = NCBI4NA_G;
        seq[gt + 1] = NCBI4NA_T;
        seq[ag] = NCBI4NA_A;
        seq[ag + 1] = NCBI4NA_G;
    }
    SubjectBlk::new(seq, SUBJECT_LEN)
}

fn link_spliced(list: &mut HspList, subject: &SubjectBlk) {
    let mut params = permissive_params();
    params.longest_intron = 4000;
    blast_link_hsps(
        BlastProgram::Tblastn,
        list,
        &QueryInfo::single(200, SEARCHSP, 0),
        subject,
        &protein_score_blk(),
        &hit_params(params),
        false,
    )
    .unwrap();
}

#[test]
fn test_two_exons_bridge_an_intron_with_consensus() {
    // Exons abut on the query with a 5-residue gap; the donor window
    // starts at the first exon's subject end, the acceptor window just
    // before the second exon's subject start
    let subject = spliced_subject(&[(90, 1998)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_hsp(60, 35, 65, 2000, 2090),
    ]);
    link_spliced(&mut list, &subject);

    let singleton = karlin_stoe_simple(60, &protein_kbp(), SEARCHSP);
    for h in &list.hsps {
        assert_eq!(h.num, 2);
        assert!(h.linked_set);
        assert_eq!(h.splice_quality, 1);
        assert_eq!(h.ordering_method, Some(OrderingMethod::LargeGap));
        assert!(h.evalue < singleton);
    }
    assert!(list.hsps[0].start_of_chain);
    assert!(!list.hsps[1].start_of_chain);
    assert_eq!(list.hsps[0].sum_score, 120);
}

#[test]
fn test_missing_consensus_scores_negative() {
    // Same exons, but the subject carries no GT anywhere
    let subject = SubjectBlk::new(vec![NCBI4NA_C; SUBJECT_LEN as usize], SUBJECT_LEN);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_hsp(60, 35, 65, 2000, 2090),
    ]);
    link_spliced(&mut list, &subject);

    for h in &list.hsps {
        assert_eq!(h.num, 2);
        assert_eq!(h.splice_quality, -1);
    }
}

#[test]
fn test_overlapping_exons_widen_the_scan_window() {
    // Two residues of query overlap stretch the donor window to
    // 3*2+2 = 8 bases ending past the exon boundary
    let subject = spliced_subject(&[(93, 1995)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 32, 0, 96),
        make_hsp(60, 30, 60, 2000, 2090),
    ]);
    link_spliced(&mut list, &subject);

    for h in &list.hsps {
        assert_eq!(h.num, 2);
        assert_eq!(h.splice_quality, 1);
    }
}

#[test]
fn test_three_exons_accumulate_per_junction_quality() {
    let subject = spliced_subject(&[(90, 1998), (2090, 3498)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_hsp(60, 35, 65, 2000, 2090),
        make_hsp(60, 70, 100, 3500, 3590),
    ]);
    link_spliced(&mut list, &subject);

    let singleton = karlin_stoe_simple(60, &protein_kbp(), SEARCHSP);
    for h in &list.hsps {
        assert_eq!(h.num, 3);
        assert!(h.evalue < singleton);
        assert_eq!(h.evalue, list.hsps[0].evalue);
    }
    // The middle exon sits on both junctions
    let qualities: Vec<i32> = list.hsps.iter().map(|h| h.splice_quality).collect();
    assert_eq!(qualities, vec![1, 2, 1]);

    let offsets: Vec<i32> = list.hsps.iter().map(|h| h.query.offset).collect();
    assert_eq!(offsets, vec![0, 35, 70]);
    assert_eq!(list.hsps[0].sum_score, 180);
}

#[test]
fn test_intron_bound_blocks_distant_partners() {
    // Second exon 4910 bases downstream, past the 4000 intron limit
    let subject = spliced_subject(&[(90, 4998)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_hsp(60, 35, 65, 5000, 5090),
    ]);
    link_spliced(&mut list, &subject);

    for h in &list.hsps {
        assert_eq!(h.num, 1);
        assert!(h.start_of_chain);
        assert!(!h.linked_set);
        assert_eq!(h.splice_quality, 0);
        assert!(h.ordering_method.is_none());
    }
}

#[test]
fn test_subject_strands_do_not_merge() {
    let subject = spliced_subject(&[(90, 1998)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_framed_hsp(60, 1, 35, 65, -1, 2000, 2090),
    ]);
    link_spliced(&mut list, &subject);

    for h in &list.hsps {
        assert_eq!(h.num, 1);
        assert_eq!(h.splice_quality, 0);
    }
}

#[test]
fn test_merge_requires_improvement_over_both_singletons() {
    // A marginal partner drags the combined E-value above the strong
    // exon's own, so the chain never forms
    let subject = spliced_subject(&[(90, 1998)]);
    let mut list = HspList::new(vec![
        make_hsp(60, 0, 30, 0, 90),
        make_hsp(25, 35, 65, 2000, 2090),
    ]);
    link_spliced(&mut list, &subject);

    let kbp = protein_kbp();
    assert_eq!(list.hsps[0].score, 60);
    for h in &list.hsps {
        assert_eq!(h.num, 1);
        assert_eq!(h.splice_quality, 0);
        assert_close(
            h.evalue,
            karlin_stoe_simple(h.score, &kbp, SEARCHSP),
            1e-12,
            "unlinked exon keeps its individual evalue",
        );
    }
}
