//! HSP linking: group compatible HSPs into chains and score each chain
//! with Karlin-Altschul sum statistics.
//!
//! One entry point, two engines. Programs with a translated subject that
//! permit introns (tblastn, psitblastn with `longest_intron > 0`) get the
//! uneven-gap spliced linker; everything else gets the even-gap engine.
//!
//! NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (BLAST_LinkHsps)

pub mod even_gap;
pub mod uneven_gap;

use std::collections::TryReserveError;

use thiserror::Error;

use crate::hsp::{Hsp, HspList};
use crate::params::HitSavingParams;
use crate::query_info::{BlastProgram, QueryInfo, ScoreBlk, SubjectBlk};

/// Failures a linking pass can surface.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A scratch buffer could not be reserved. The pass reserves all of
    /// its scratch before mutating the list, so the list is unchanged.
    #[error("could not allocate {what} scratch: {source}")]
    OutOfMemory {
        what: &'static str,
        source: TryReserveError,
    },
}

/// Link the HSPs of one list in place.
///
/// The list comes back with the same HSPs reordered so every chain head is
/// immediately followed by its members, each member carrying the chain's
/// `num`, `sum_score` and `evalue`. An empty list is a successful no-op.
pub fn blast_link_hsps(
    program: BlastProgram,
    hsp_list: &mut HspList,
    query_info: &QueryInfo,
    subject: &SubjectBlk,
    sbp: &ScoreBlk,
    hit_params: &HitSavingParams,
    gapped: bool,
) -> Result<(), LinkError> {
    if hsp_list.is_empty() {
        return Ok(());
    }

    for h in hsp_list.hsps.iter_mut() {
        h.num = 1;
    }

    let params = &hit_params.link_hsp_params;
    if program.supports_spliced_linking() && params.longest_intron > 0 {
        uneven_gap::uneven_gap_link_hsps(
            program, hsp_list, query_info, subject, sbp, params, gapped,
        )
    } else {
        even_gap::even_gap_link_hsps(
            program,
            hsp_list,
            query_info,
            subject.length,
            sbp,
            params,
            gapped,
        )
    }
}

/// Link a batch of lists, one rayon task per subject.
///
/// Lists and subjects pair up positionally; each list is still linked
/// single-threaded.
#[cfg(feature = "parallel")]
pub fn blast_link_hsps_many(
    program: BlastProgram,
    lists: &mut [HspList],
    subjects: &[SubjectBlk],
    query_info: &QueryInfo,
    sbp: &ScoreBlk,
    hit_params: &HitSavingParams,
    gapped: bool,
) -> Result<(), LinkError> {
    use rayon::prelude::*;

    debug_assert_eq!(lists.len(), subjects.len());
    lists
        .par_iter_mut()
        .zip(subjects.par_iter())
        .try_for_each(|(list, subject)| {
            blast_link_hsps(program, list, query_info, subject, sbp, hit_params, gapped)
        })
}

/// Fallibly reserve a scratch vector; the caller's pass must not have
/// mutated anything yet when this can still fail.
pub(crate) fn try_scratch<T>(capacity: usize, what: &'static str) -> Result<Vec<T>, LinkError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|source| LinkError::OutOfMemory { what, source })?;
    Ok(buf)
}

/// Permute the arena into `final_order`, remap the stored chain links
/// through the permutation, and thread `prev`/`next` sequentially.
///
/// `new_pos` and `permuted` are caller-reserved scratch of the arena's
/// length.
pub(crate) fn finalize_arena(
    hsp_list: &mut HspList,
    final_order: &[usize],
    new_pos: &mut Vec<usize>,
    permuted: &mut Vec<Hsp>,
) {
    let n = hsp_list.len();
    debug_assert_eq!(final_order.len(), n);

    new_pos.clear();
    new_pos.resize(n, 0);
    for (target, &source) in final_order.iter().enumerate() {
        new_pos[source] = target;
    }

    permuted.clear();
    permuted.extend(final_order.iter().map(|&i| hsp_list.hsps[i]));
    for (i, h) in permuted.iter_mut().enumerate() {
        for slot in h.hsp_link.link.iter_mut() {
            *slot = slot.map(|t| new_pos[t]);
        }
        h.prev = if i == 0 { None } else { Some(i - 1) };
        h.next = if i + 1 < n { Some(i + 1) } else { None };
    }
    hsp_list.hsps.copy_from_slice(permuted);
}
