//! Uneven-gap HSP linking for translated-subject searches with introns.
//!
//! Where the even-gap engine runs a global best-chain search, this one is
//! greedy and local: starting from the best-scoring chain head it looks a
//! few residues around each chain end for a partner whose subject
//! coordinates allow an intron of at most `longest_intron` nucleotides,
//! and merges the two chains whenever the combined sum E-value beats both
//! of their own. Finished chains then get a splice-consensus scan: each
//! adjacent pair earns +1 `splice_quality` on both members when a `GT…AG`
//! junction fits the query overlap, -1 when none does.
//!
//! Subject coordinates are nucleotide positions on the raw (untranslated)
//! subject for this path; only the effective lengths of the statistics
//! are codon-scaled.
//!
//! NCBI reference: ncbi-c/tools/blastutl.c (new_link_hsps,
//! FindSpliceJunction, SumHSPEvalue)

use crate::hsp::{Hsp, HspList, OrderingMethod};
use crate::link::{finalize_arena, try_scratch, LinkError};
use crate::ordering::sumscore_compare_hsps;
use crate::params::{LinkHspParams, CODON_LENGTH};
use crate::query_info::{
    BlastProgram, QueryInfo, SubjectBlk, NCBI4NA_A, NCBI4NA_G, NCBI4NA_T,
};
use crate::stats::sum_statistics::{gap_decay_divisor, uneven_gap_sum_e};
use crate::stats::{karlin_stoe_simple, KarlinBlk};
use crate::trace;

/// Query-side slack when hunting for a partner, in residues.
pub(crate) const WINDOW_SIZE: i32 = 20;
/// Splice-scan reach when the pair does not overlap on the query.
pub(crate) const MAX_SPLICE_DIST: i32 = 5;

pub(crate) fn uneven_gap_link_hsps(
    program: BlastProgram,
    hsp_list: &mut HspList,
    query_info: &QueryInfo,
    subject: &SubjectBlk,
    sbp: &crate::query_info::ScoreBlk,
    params: &LinkHspParams,
    gapped: bool,
) -> Result<(), LinkError> {
    let kbp = sbp.kbp_for(gapped);
    let subject_length = subject.length;
    uneven_gap_link_hsps_with(
        hsp_list,
        query_info,
        subject,
        kbp,
        |head, candidate| {
            sum_hsp_evalue(program, query_info, subject_length, kbp, params, head, candidate)
        },
        params.longest_intron,
    )
}

/// Engine body with the pair-scoring function abstracted out, so tests can
/// substitute a counting or constant scorer.
pub(crate) fn uneven_gap_link_hsps_with<F>(
    hsp_list: &mut HspList,
    query_info: &QueryInfo,
    subject: &SubjectBlk,
    kbp: &[KarlinBlk],
    mut combined_evalue: F,
    longest_intron: i32,
) -> Result<(), LinkError>
where
    F: FnMut(&Hsp, &Hsp) -> f64,
{
    let n = hsp_list.len();
    if n == 0 {
        return Ok(());
    }

    let mut sumscore_order: Vec<usize> = try_scratch(n, "sum-score order")?;
    let mut offset_order: Vec<usize> = try_scratch(n, "offset order")?;
    let mut end_order: Vec<usize> = try_scratch(n, "end order")?;
    let mut final_order: Vec<usize> = try_scratch(n, "final order")?;
    let mut new_pos: Vec<usize> = try_scratch(n, "position map")?;
    let mut permuted: Vec<Hsp> = try_scratch(n, "permute buffer")?;

    let hsps = &mut hsp_list.hsps;

    // Every HSP starts as its own chain with an individual E-value
    for h in hsps.iter_mut() {
        h.num = 1;
        h.sum_score = 0;
        h.linked_set = false;
        h.start_of_chain = true;
        h.splice_quality = 0;
        h.ordering_method = None;
        h.prev = None;
        h.next = None;
        let ctx = query_info.contexts[h.context];
        h.evalue = karlin_stoe_simple(h.score, &kbp[h.context], ctx.eff_searchsp);
    }

    sumscore_order.extend(0..n);
    sumscore_order.sort_unstable_by(|&a, &b| sumscore_compare_hsps(&hsps[a], &hsps[b]));
    offset_order.extend(0..n);
    offset_order.sort_unstable_by(|&a, &b| hsps[a].query.offset.cmp(&hsps[b].query.offset));
    end_order.extend(0..n);
    end_order.sort_unstable_by(|&a, &b| hsps[a].query.end.cmp(&hsps[b].query.end));

    // Greedy merging, best initial score first. Absorbed heads drop out of
    // consideration when their start_of_chain flag clears.
    for k in 0..n {
        let mut head = sumscore_order[k];
        if !hsps[head].start_of_chain {
            continue;
        }

        loop {
            let tail = chain_tail_of(hsps, head);
            // (partner, partner's chain head, combined e-value)
            let mut best: Option<(usize, usize, f64)> = None;

            // Forward: a chain starting near our tail's query end
            let tail_q_end = hsps[tail].query.end;
            let tail_s_end = hsps[tail].subject.end;
            let lo = offset_order
                .partition_point(|&i| hsps[i].query.offset < tail_q_end - WINDOW_SIZE);
            for &cand in &offset_order[lo..] {
                if hsps[cand].query.offset > tail_q_end + WINDOW_SIZE {
                    break;
                }
                if cand == head
                    || !hsps[cand].start_of_chain
                    || hsps[cand].context != hsps[head].context
                    || hsps[cand].subject.strand() != hsps[head].subject.strand()
                    || hsps[cand].subject.offset <= tail_s_end - WINDOW_SIZE
                    || hsps[cand].subject.offset >= tail_s_end + longest_intron
                {
                    continue;
                }
                let ev = combined_evalue(&hsps[head], &hsps[cand]);
                if ev < hsps[head].evalue
                    && ev < hsps[cand].evalue
                    && best.map_or(true, |(_, _, b)| ev < b)
                {
                    best = Some((cand, cand, ev));
                }
            }

            // Reverse: a chain ending near our head's query offset
            let head_q_off = hsps[head].query.offset;
            let head_s_off = hsps[head].subject.offset;
            let lo =
                end_order.partition_point(|&i| hsps[i].query.end < head_q_off - WINDOW_SIZE);
            for &cand in &end_order[lo..] {
                if hsps[cand].query.end > head_q_off + WINDOW_SIZE {
                    break;
                }
                if hsps[cand].next.is_some()
                    || hsps[cand].context != hsps[head].context
                    || hsps[cand].subject.strand() != hsps[head].subject.strand()
                    || hsps[cand].subject.end >= head_s_off + WINDOW_SIZE
                    || hsps[cand].subject.end <= head_s_off - longest_intron
                {
                    continue;
                }
                let cand_head = chain_head_of(hsps, cand);
                if cand_head == head {
                    continue;
                }
                let ev = combined_evalue(&hsps[cand_head], &hsps[head]);
                if ev < hsps[head].evalue
                    && ev < hsps[cand_head].evalue
                    && best.map_or(true, |(_, _, b)| ev < b)
                {
                    best = Some((cand, cand_head, ev));
                }
            }

            let Some((partner, partner_head, ev)) = best else {
                break;
            };

            if trace::matches_target(&hsps[head]) || trace::matches_target(&hsps[partner]) {
                eprintln!(
                    "[hsplink trace] spliced merge accepted: evalue={:.3e} forward={}",
                    ev,
                    partner == partner_head
                );
            }

            if partner == partner_head {
                // Append the partner chain after our tail
                let absorbed_num = hsps[partner].num;
                let absorbed_best = hsps[partner].best_score();
                let own_best = hsps[head].best_score();
                hsps[tail].next = Some(partner);
                hsps[partner].prev = Some(tail);
                hsps[partner].start_of_chain = false;
                let h = &mut hsps[head];
                h.num += absorbed_num;
                h.sum_score = own_best + absorbed_best;
                h.evalue = ev;
            } else {
                // Prepend: the partner's chain head takes over
                let own_num = hsps[head].num;
                let own_best = hsps[head].best_score();
                let absorbing_best = hsps[partner_head].best_score();
                hsps[partner].next = Some(head);
                hsps[head].prev = Some(partner);
                hsps[head].start_of_chain = false;
                let h = &mut hsps[partner_head];
                h.num += own_num;
                h.sum_score = absorbing_best + own_best;
                h.evalue = ev;
                head = partner_head;
            }
        }
    }

    // Splice-consensus scan over every adjacent pair
    for i in 0..n {
        if !hsps[i].start_of_chain {
            continue;
        }
        let mut a = i;
        while let Some(b) = hsps[a].next {
            let delta = if find_splice_junction(&subject.sequence, &hsps[a], &hsps[b]) {
                1
            } else {
                -1
            };
            hsps[a].splice_quality += delta;
            hsps[b].splice_quality += delta;
            a = b;
        }
    }

    // Chains contiguous in sum-score order, head first
    sumscore_order.clear();
    sumscore_order.extend((0..n).filter(|&i| hsps[i].start_of_chain));
    sumscore_order.sort_unstable_by(|&a, &b| sumscore_compare_hsps(&hsps[a], &hsps[b]));

    final_order.clear();
    for &h in &sumscore_order {
        let (num, sum, ev) = (hsps[h].num, hsps[h].sum_score, hsps[h].evalue);
        let linked = hsps[h].next.is_some();
        let mut cursor = Some(h);
        while let Some(i) = cursor {
            final_order.push(i);
            let hh = &mut hsps[i];
            hh.num = num;
            hh.sum_score = sum;
            hh.evalue = ev;
            hh.linked_set = linked;
            if linked {
                hh.ordering_method = Some(OrderingMethod::LargeGap);
            }
            cursor = hh.next;
        }
    }
    debug_assert_eq!(final_order.len(), n);

    finalize_arena(hsp_list, &final_order, &mut new_pos, &mut permuted);
    Ok(())
}

fn chain_tail_of(hsps: &[Hsp], mut i: usize) -> usize {
    while let Some(nx) = hsps[i].next {
        i = nx;
    }
    i
}

fn chain_head_of(hsps: &[Hsp], mut i: usize) -> usize {
    while let Some(pv) = hsps[i].prev {
        i = pv;
    }
    i
}

/// Combined E-value of linking two chains, head's context supplying the
/// statistics.
///
/// NCBI reference: ncbi-c/tools/blastutl.c (SumHSPEvalue)
pub(crate) fn sum_hsp_evalue(
    program: BlastProgram,
    query_info: &QueryInfo,
    subject_length: i32,
    kbp: &[KarlinBlk],
    params: &LinkHspParams,
    head: &Hsp,
    candidate: &Hsp,
) -> f64 {
    let ctx = query_info.contexts[head.context];
    let kb = kbp[head.context];
    let eff_query = (ctx.query_length - ctx.length_adjustment).max(1);
    let mut eff_subject = (subject_length - ctx.length_adjustment).max(1);
    if program.subject_is_translated() {
        eff_subject = (eff_subject / CODON_LENGTH).max(1);
    }

    let sum_score = head.best_score() + candidate.best_score();
    let num = head.num + candidate.num;
    let xsum = kb.lambda * f64::from(sum_score) - f64::from(num) * kb.log_k;

    uneven_gap_sum_e(
        params.overlap_size + params.gap_size + 1,
        params.overlap_size + params.longest_intron + 1,
        num,
        xsum,
        eff_query,
        eff_subject,
        ctx.eff_searchsp,
        gap_decay_divisor(params.gap_decay_rate, num as usize),
    )
}

fn nt(seq: &[u8], pos: i32) -> u8 {
    if pos < 0 {
        return 0;
    }
    seq.get(pos as usize).copied().unwrap_or(0)
}

/// Look for a `GT…AG` consensus between two exon hits. With a query
/// overlap of `ovl` residues the donor may sit anywhere in the
/// `3*ovl + 2` nucleotides the overlap could occupy; without overlap a
/// fixed few bases past the exon boundary are scanned. The donor and
/// acceptor scans are independent.
///
/// NCBI reference: ncbi-c/tools/blastutl.c (FindSpliceJunction)
pub(crate) fn find_splice_junction(seq: &[u8], hsp1: &Hsp, hsp2: &Hsp) -> bool {
    let overlap = hsp1.query.end - hsp2.query.offset;
    let (length, gt_start, ag_start) = if overlap >= 0 {
        let length = 3 * overlap + 2;
        (length, hsp1.subject.end - 3 * overlap, hsp2.subject.offset - length)
    } else {
        (MAX_SPLICE_DIST, hsp1.subject.end, hsp2.subject.offset - MAX_SPLICE_DIST)
    };

    let mut donor = false;
    for i in 0..length - 1 {
        if nt(seq, gt_start + i) == NCBI4NA_G && nt(seq, gt_start + i + 1) == NCBI4NA_T {
            donor = true;
            break;
        }
    }
    if !donor {
        return false;
    }
    for i in 0..length - 1 {
        if nt(seq, ag_start + i) == NCBI4NA_A && nt(seq, ag_start + i + 1) == NCBI4NA_G {
            return true;
        }
    }
    false
}
