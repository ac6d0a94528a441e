//! Even-gap HSP linking, the primary chaining engine.
//!
//! HSPs are sorted into frame groups and each group is drained by repeated
//! best-chain extraction. Two gap models run side by side over shared
//! per-HSP state: model 0 ("small gap") only links HSPs whose trimmed
//! coordinates sit within a fixed window, model 1 ("large gap") links any
//! consistently ordered pair. Whichever model gives the extracted chain a
//! lower sum E-value names it.
//!
//! The inner loops carry the reference implementation's amortization: a
//! helper array mirrors the active list, and each entry's `next_larger`
//! index lets the model-1 scan skip runs of entries whose sums cannot beat
//! the current candidate. Between extractions, an HSP whose previous best
//! link is untouched reuses it instead of rescanning (`changed`,
//! `path_changed`). Both shortcuts are output-neutral; the tests compare
//! them against full recomputation.
//!
//! NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
//! (s_BlastEvenGapLinkHSPs)

use crate::hsp::{Hsp, HspLink, HspList, OrderingMethod, LINKED_TO_REMOVED};
use crate::link::{finalize_arena, try_scratch, LinkError};
use crate::ordering::{fwd_compare_hsps, rev_compare_hsps, rev_compare_hsps_cfj};
use crate::params::{LinkHspParams, CODON_LENGTH, TRIM_SIZE};
use crate::query_info::{BlastProgram, QueryInfo, ScoreBlk};
use crate::stats::sum_statistics::{gap_decay_divisor, large_gap_sum_e, small_gap_sum_e};
use crate::stats::{normalize_score, KarlinBlk};
use crate::trace;

/// Helper-array entry shadowing one active HSP.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (LinkHelpStruct)
#[derive(Debug, Clone, Copy)]
struct LinkHelp {
    /// Arena index; sentinel slots never read it.
    hsp: usize,
    q_off_trim: i32,
    s_off_trim: i32,
    sum: [i32; 2],
    /// Nearest earlier entry whose model-1 sum is strictly larger; 0 ends
    /// the skip chain.
    next_larger: usize,
    /// Running maximum of model-1 sums. Maintained for parity with the
    /// reference loop; selection never reads it.
    maxsum1: i32,
}

impl LinkHelp {
    fn sentinel() -> Self {
        LinkHelp {
            hsp: usize::MAX,
            q_off_trim: 0,
            s_off_trim: 0,
            sum: [0, 0],
            next_larger: 0,
            maxsum1: -10000,
        }
    }
}

/// Read-only surroundings of one linking pass.
struct LinkEnv<'a> {
    query_info: &'a QueryInfo,
    kbp: &'a [KarlinBlk],
    params: &'a LinkHspParams,
    subject_length: i32,
    translated_subject: bool,
    full_recompute: bool,
}

pub(crate) fn even_gap_link_hsps(
    program: BlastProgram,
    hsp_list: &mut HspList,
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &ScoreBlk,
    params: &LinkHspParams,
    gapped: bool,
) -> Result<(), LinkError> {
    even_gap_link_hsps_impl(
        program,
        hsp_list,
        query_info,
        subject_length,
        sbp,
        params,
        gapped,
        false,
    )
}

/// `full_recompute` disables the incremental shortcuts so every pass
/// rebuilds from scratch; the observable output must not change.
#[allow(clippy::too_many_arguments)]
pub(crate) fn even_gap_link_hsps_impl(
    program: BlastProgram,
    hsp_list: &mut HspList,
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &ScoreBlk,
    params: &LinkHspParams,
    gapped: bool,
    full_recompute: bool,
) -> Result<(), LinkError> {
    let n = hsp_list.len();
    if n == 0 {
        return Ok(());
    }

    // Every scratch buffer is reserved before the first mutation, so an
    // allocation failure leaves the list untouched.
    let mut order: Vec<usize> = try_scratch(n, "hsp order")?;
    let mut lh: Vec<LinkHelp> = try_scratch((n + 5).max(1024), "link helper")?;
    let mut final_order: Vec<usize> = try_scratch(n, "final order")?;
    let mut new_pos: Vec<usize> = try_scratch(n, "position map")?;
    let mut permuted: Vec<Hsp> = try_scratch(n, "permute buffer")?;

    let env = LinkEnv {
        query_info,
        kbp: sbp.kbp_for(gapped),
        params,
        subject_length,
        translated_subject: program.subject_is_translated(),
        full_recompute,
    };

    let hsps = &mut hsp_list.hsps;
    order.extend(0..n);
    order.sort_unstable_by(|&a, &b| rev_compare_hsps_cfj(&hsps[a], &hsps[b]));

    // Frame groups are runs of the sorted order sharing strand signs
    let group_key = |h: &Hsp| (h.query.strand(), h.subject.strand());
    let mut group_start = 0;
    while group_start < n {
        let key = group_key(&hsps[order[group_start]]);
        let mut group_end = group_start + 1;
        while group_end < n && group_key(&hsps[order[group_end]]) == key {
            group_end += 1;
        }
        link_frame_group(&env, hsps, &order[group_start..group_end], &mut lh);
        group_start = group_end;
    }

    // Chain heads first in query order, each followed by its members
    order.sort_unstable_by(|&a, &b| rev_compare_hsps(&hsps[a], &hsps[b]));
    order.sort_by(|&a, &b| fwd_compare_hsps(&hsps[a], &hsps[b]));

    final_order.clear();
    for &i in order.iter() {
        let head = hsps[i];
        if head.linked_set && !head.start_of_chain {
            continue;
        }
        let Some(method) = head.ordering_method else {
            final_order.push(i);
            continue;
        };
        let m = method.index();
        let num = head.hsp_link.num[m];
        let sum = head.hsp_link.sum[m];
        let mut cursor = Some(i);
        while let Some(j) = cursor {
            final_order.push(j);
            let hj = &mut hsps[j];
            hj.num = num;
            hj.sum_score = sum;
            cursor = hj.hsp_link.link[m];
        }
    }
    debug_assert_eq!(final_order.len(), n);

    finalize_arena(hsp_list, &final_order, &mut new_pos, &mut permuted);
    Ok(())
}

/// Drain one frame group by repeated best-chain extraction.
fn link_frame_group(env: &LinkEnv<'_>, hsps: &mut [Hsp], group: &[usize], lh: &mut Vec<LinkHelp>) {
    let params = env.params;
    let cutoff = [params.cutoff_small_gap, params.cutoff_big_gap];
    let ignore_small_gaps = params.ignore_small_gaps();
    let gap_prob = params.gap_prob;
    let gap_decay_rate = params.gap_decay_rate;
    let window = params.small_gap_window();

    // Context of the first group member drives the effective lengths
    // NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c:559-574
    let query_context = hsps[group[0]].context;
    let ctx = env.query_info.contexts[query_context];
    let eff_query_length = (ctx.query_length - ctx.length_adjustment).max(1);
    let (subj_len, subj_adj) = if env.translated_subject {
        (env.subject_length / CODON_LENGTH, ctx.length_adjustment / CODON_LENGTH)
    } else {
        (env.subject_length, ctx.length_adjustment)
    };
    let eff_subject_length = (subj_len - subj_adj).max(1);
    let eff_searchsp = ctx.eff_searchsp;

    // Working-list threading and per-HSP state, in sorted order
    for (pos, &idx) in group.iter().enumerate() {
        let xscore = {
            let kb = env.kbp[hsps[idx].context];
            normalize_score(hsps[idx].score, kb.lambda, kb.log_k)
        };
        let h = &mut hsps[idx];
        h.query.set_trims();
        h.subject.set_trims();
        h.hsp_link = HspLink {
            link: [None; 2],
            num: [1; 2],
            sum: [h.score - cutoff[0], h.score - cutoff[1]],
            xsum: [xscore; 2],
            changed: true,
        };
        h.linked_to = 0;
        h.start_of_chain = false;
        h.prev = if pos == 0 { None } else { Some(group[pos - 1]) };
        h.next = group.get(pos + 1).copied();

        if trace::matches_target(h) {
            eprintln!(
                "[hsplink trace] target enters frame group: score={} context={} group_size={}",
                h.score,
                h.context,
                group.len()
            );
        }
    }
    let mut active_head: Option<usize> = Some(group[0]);

    let mut remaining = group.len();
    let mut first_pass = true;
    let mut path_changed = false;

    while remaining > 0 {
        let mut best: [Option<usize>; 2] = [None, None];
        let mut best_sum = [-cutoff[0], -cutoff[1]];
        let mut use_current_max = false;

        if !first_pass && !env.full_recompute {
            // Current sums are valid; find the best chain ends directly
            let mut cursor = active_head;
            while let Some(i) = cursor {
                let h = &hsps[i];
                if !ignore_small_gaps && h.hsp_link.sum[0] >= best_sum[0] {
                    best_sum[0] = h.hsp_link.sum[0];
                    best[0] = Some(i);
                }
                if h.hsp_link.sum[1] >= best_sum[1] {
                    best_sum[1] = h.hsp_link.sum[1];
                    best[1] = Some(i);
                }
                cursor = h.next;
            }

            if !path_changed {
                use_current_max = true;
            } else {
                // A removed chain may have carried part of a candidate's
                // link path; walk the paths to find out
                use_current_max = true;
                'validate: for (index, &candidate) in best.iter().enumerate() {
                    if index == 0 && ignore_small_gaps {
                        continue;
                    }
                    let mut cursor = candidate;
                    while let Some(i) = cursor {
                        if hsps[i].linked_to == LINKED_TO_REMOVED {
                            use_current_max = false;
                            break 'validate;
                        }
                        cursor = hsps[i].hsp_link.link[index];
                    }
                }
            }
        }

        if !use_current_max {
            rebuild_helper(hsps, active_head, lh);
            best = [None, None];
            best_sum = [-cutoff[0], -cutoff[1]];

            if !ignore_small_gaps {
                run_small_gap_pass(env, hsps, lh, cutoff[0], window, &mut best, &mut best_sum);
            }
            run_large_gap_pass(env, hsps, lh, cutoff[1], first_pass, &mut best, &mut best_sum);

            path_changed = false;
            first_pass = false;
        }

        // Score the best chain of each model and keep the lower E-value
        const INT4_MAX: f64 = i32::MAX as f64;
        let mut prob = [f64::MAX; 2];
        let ordering: usize;
        if !ignore_small_gaps {
            if let Some(b0) = best[0] {
                let (num, xsum) = {
                    let h = &mut hsps[b0];
                    // Restore the raw sum before the statistics see it
                    h.hsp_link.sum[0] += (h.hsp_link.num[0] as i32) * cutoff[0];
                    (h.hsp_link.num[0], h.hsp_link.xsum[0])
                };
                prob[0] = small_gap_sum_e(
                    window,
                    num,
                    xsum,
                    eff_query_length,
                    eff_subject_length,
                    eff_searchsp,
                    gap_decay_divisor(gap_decay_rate, num as usize),
                );
                if num > 1 {
                    if gap_prob == 0.0 || prob[0] / gap_prob > INT4_MAX {
                        prob[0] = INT4_MAX;
                    } else {
                        prob[0] /= gap_prob;
                    }
                }
            }
            if let Some(b1) = best[1] {
                let (num, xsum) = {
                    let h = &hsps[b1];
                    (h.hsp_link.num[1], h.hsp_link.xsum[1])
                };
                prob[1] = large_gap_sum_e(
                    num,
                    xsum,
                    eff_query_length,
                    eff_subject_length,
                    eff_searchsp,
                    gap_decay_divisor(gap_decay_rate, num as usize),
                );
                if num > 1 {
                    let denom = 1.0 - gap_prob;
                    if denom == 0.0 || prob[1] / denom > INT4_MAX {
                        prob[1] = INT4_MAX;
                    } else {
                        prob[1] /= denom;
                    }
                }
            }
            ordering = if prob[0] <= prob[1] { 0 } else { 1 };
        } else {
            if let Some(b1) = best[1] {
                let (num, xsum) = {
                    let h = &mut hsps[b1];
                    h.hsp_link.sum[1] += (h.hsp_link.num[1] as i32) * cutoff[1];
                    (h.hsp_link.num[1], h.hsp_link.xsum[1])
                };
                prob[1] = large_gap_sum_e(
                    num,
                    xsum,
                    eff_query_length,
                    eff_subject_length,
                    eff_searchsp,
                    gap_decay_divisor(gap_decay_rate, num as usize),
                );
                if num > 1 {
                    let denom = 1.0 - gap_prob;
                    if denom == 0.0 || prob[1] / denom > INT4_MAX {
                        prob[1] = INT4_MAX;
                    } else {
                        prob[1] /= denom;
                    }
                }
            }
            ordering = 1;
        }

        // The DP passes assign `best` whenever the list is non-empty, so
        // the fallbacks here should never fire; bail rather than spin if
        // they somehow do.
        let head = match best[ordering].or(best[1 - ordering]) {
            Some(i) => i,
            None => break,
        };
        let method = OrderingMethod::BOTH[ordering];
        let chain_evalue = prob[ordering];
        let linked_set = hsps[head].hsp_link.link[ordering].is_some();
        let chain_num = hsps[head].hsp_link.num[ordering];

        if hsps[head].linked_to > 0 {
            path_changed = true;
        }

        // Unlink every chain member from the working list in O(1) each
        let mut cursor = Some(head);
        while let Some(i) = cursor {
            if trace::matches_target(&hsps[i]) {
                eprintln!(
                    "[hsplink trace] target extracted: head={} num={} method={:?} evalue={:.3e}",
                    i == head,
                    chain_num,
                    method,
                    chain_evalue
                );
            }
            let h = &mut hsps[i];
            if h.linked_to > 1 {
                path_changed = true;
            }
            h.linked_set = linked_set;
            h.ordering_method = Some(method);
            h.evalue = chain_evalue;
            h.start_of_chain = i == head;
            h.linked_to = LINKED_TO_REMOVED;
            h.hsp_link.changed = true;

            let (p, nx, chain_next) = (h.prev, h.next, h.hsp_link.link[ordering]);
            h.prev = None;
            h.next = None;
            match p {
                Some(pi) => hsps[pi].next = nx,
                None => active_head = nx,
            }
            if let Some(ni) = nx {
                hsps[ni].prev = p;
            }
            remaining -= 1;
            cursor = chain_next;
        }
    }
}

/// Mirror the active list into the helper array, sentinels at 0 and 1.
fn rebuild_helper(hsps: &mut [Hsp], active_head: Option<usize>, lh: &mut Vec<LinkHelp>) {
    lh.clear();
    lh.push(LinkHelp::sentinel());
    lh.push(LinkHelp::sentinel());

    let mut running_max = -10000;
    let mut cursor = active_head;
    while let Some(i) = cursor {
        hsps[i].linked_to = 0;
        let h = hsps[i];
        let sum1 = h.hsp_link.sum[1];

        let mut prev = lh.len() - 1;
        while prev > 0 && sum1 >= lh[prev].sum[1] {
            prev = lh[prev].next_larger;
        }
        running_max = running_max.max(sum1);

        lh.push(LinkHelp {
            hsp: i,
            q_off_trim: h.query.offset_trim,
            s_off_trim: h.subject.offset_trim,
            sum: h.hsp_link.sum,
            next_larger: prev,
            maxsum1: running_max,
        });
        cursor = h.next;
    }
}

/// Model-0 pass: best predecessor within the trimmed-coordinate window.
fn run_small_gap_pass(
    env: &LinkEnv<'_>,
    hsps: &mut [Hsp],
    lh: &mut [LinkHelp],
    cutoff: i32,
    window: i32,
    best: &mut [Option<usize>; 2],
    best_sum: &mut [i32; 2],
) {
    for h_idx in 2..lh.len() {
        let i = lh[h_idx].hsp;
        let mut h_num: i16 = 0;
        let mut h_sum: i32 = 0;
        let mut h_xsum: f64 = 0.0;
        let mut h_link: Option<usize> = None;

        if hsps[i].score > cutoff {
            let h_qe = hsps[i].query.end_trim;
            let h_se = hsps[i].subject.end_trim;
            let h_qe_gap = h_qe + window;
            let h_se_gap = h_se + window;

            for j in (2..h_idx).rev() {
                let entry = lh[j];
                // Sorted by descending offset: once a candidate start is
                // past the window plus the largest trim, all earlier ones
                // are too
                if entry.q_off_trim > h_qe_gap + TRIM_SIZE {
                    break;
                }
                let disallowed = entry.q_off_trim <= h_qe
                    || entry.s_off_trim <= h_se
                    || entry.q_off_trim > h_qe_gap
                    || entry.s_off_trim > h_se_gap;
                if disallowed {
                    continue;
                }
                if entry.sum[0] > h_sum {
                    let p = entry.hsp;
                    h_num = hsps[p].hsp_link.num[0];
                    h_sum = hsps[p].hsp_link.sum[0];
                    h_xsum = hsps[p].hsp_link.xsum[0];
                    h_link = Some(p);
                }
            }
        }

        commit_link(env, hsps, lh, h_idx, 0, h_num, h_sum, h_xsum, h_link, cutoff, best, best_sum);
    }
}

/// Model-1 pass: best predecessor anywhere downstream, `next_larger`
/// skipping runs that cannot improve the running best.
fn run_large_gap_pass(
    env: &LinkEnv<'_>,
    hsps: &mut [Hsp],
    lh: &mut [LinkHelp],
    cutoff: i32,
    first_pass: bool,
    best: &mut [Option<usize>; 2],
    best_sum: &mut [i32; 2],
) {
    let incremental = !first_pass && !env.full_recompute;

    for h_idx in 2..lh.len() {
        let i = lh[h_idx].hsp;
        let mut h_num: i16 = 0;
        let mut h_sum: i32 = 0;
        let mut h_xsum: f64 = 0.0;
        let mut h_link: Option<usize> = None;

        hsps[i].hsp_link.changed = true;
        let prev_link = hsps[i].hsp_link.link[1];
        let prev_unchanged = match prev_link {
            None => true,
            Some(p) => !hsps[p].hsp_link.changed,
        };

        if incremental && prev_unchanged {
            // The previous best choice was not touched by the last
            // extraction, so it is still the best choice
            if let Some(p) = prev_link {
                h_num = hsps[p].hsp_link.num[1];
                h_sum = hsps[p].hsp_link.sum[1];
                h_xsum = hsps[p].hsp_link.xsum[1];
            }
            h_link = prev_link;
            hsps[i].hsp_link.changed = false;
        } else if hsps[i].score > cutoff {
            if incremental {
                if let Some(p) = prev_link {
                    if hsps[p].linked_to >= 0 {
                        // Seed one below the previous sum so an equal
                        // rescan keeps last pass's choice
                        h_sum = hsps[p].hsp_link.sum[1] - 1;
                    }
                }
            }

            let h_qe = hsps[i].query.end_trim;
            let h_se = hsps[i].subject.end_trim;

            let mut j = h_idx - 1;
            while j > 1 {
                let entry = lh[j];
                let not_better = entry.sum[1] <= h_sum;
                j -= 1;
                if not_better {
                    j = entry.next_larger;
                }
                if !(not_better || entry.q_off_trim <= h_qe || entry.s_off_trim <= h_se) {
                    let p = entry.hsp;
                    h_num = hsps[p].hsp_link.num[1];
                    h_sum = hsps[p].hsp_link.sum[1];
                    h_xsum = hsps[p].hsp_link.xsum[1];
                    h_link = Some(p);
                }
            }
        }

        commit_link(env, hsps, lh, h_idx, 1, h_num, h_sum, h_xsum, h_link, cutoff, best, best_sum);
    }
}

/// Common tail of both passes: write the new chain state for `h_idx` into
/// the HSP and the helper entry, and track the running best.
#[allow(clippy::too_many_arguments)]
fn commit_link(
    env: &LinkEnv<'_>,
    hsps: &mut [Hsp],
    lh: &mut [LinkHelp],
    h_idx: usize,
    index: usize,
    h_num: i16,
    h_sum: i32,
    h_xsum: f64,
    h_link: Option<usize>,
    cutoff: i32,
    best: &mut [Option<usize>; 2],
    best_sum: &mut [i32; 2],
) {
    let i = lh[h_idx].hsp;
    let score = hsps[i].score;
    let kb = env.kbp[hsps[i].context];
    let new_xsum = h_xsum + normalize_score(score, kb.lambda, kb.log_k);
    let new_sum = h_sum + (score - cutoff);

    {
        let h = &mut hsps[i];
        h.hsp_link.sum[index] = new_sum;
        h.hsp_link.num[index] = h_num + 1;
        h.hsp_link.link[index] = h_link;
    }
    lh[h_idx].sum[index] = new_sum;

    if index == 1 {
        lh[h_idx].maxsum1 = lh[h_idx - 1].maxsum1.max(new_sum);
        let mut prev = h_idx - 1;
        while prev > 0 && new_sum >= lh[prev].sum[1] {
            prev = lh[prev].next_larger;
        }
        lh[h_idx].next_larger = prev;
    }

    if new_sum >= best_sum[index] {
        best_sum[index] = new_sum;
        best[index] = Some(i);
    }
    hsps[i].hsp_link.xsum[index] = new_xsum;
    if let Some(l) = h_link {
        hsps[l].linked_to += 1;
    }
}
