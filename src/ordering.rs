//! HSP orderings used by the linking engines.
//!
//! Each comparator groups by query strand first (positive strand ahead of
//! negative) so that a single sorted array decomposes into frame groups by
//! a linear boundary scan. Offset keys break ties deterministically, which
//! the C originals left to qsort.

use std::cmp::Ordering;

use crate::hsp::Hsp;

/// Ascending start positions within query-strand groups.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
/// ```c
/// static int
/// s_FwdCompareHSPs(const void* v1, const void* v2)
/// {
///     ...
///     if (SIGN(h1->hsp->query.frame) != SIGN(h2->hsp->query.frame))
///     {
///         if (h1->hsp->query.frame < h2->hsp->query.frame)
///             return 1;
///         else
///             return -1;
///     }
///     if (h1->hsp->query.offset < h2->hsp->query.offset)
///         return(-1);
///     ...
///     /* In this case, the subject offset can be different. */
///     if (h1->hsp->subject.offset < h2->hsp->subject.offset)
///         return(-1);
///     ...
/// }
/// ```
pub fn fwd_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    query_strand_group(a, b)
        .then_with(|| a.query.offset.cmp(&b.query.offset))
        .then_with(|| a.subject.offset.cmp(&b.subject.offset))
}

/// Ascending end positions within query-strand groups. Used by the spliced
/// engine for its reverse-extension lookups.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_engine.c era
/// blastutl.c (end_compare_hsps)
pub fn end_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    query_strand_group(a, b)
        .then_with(|| a.query.end.cmp(&b.query.end))
        .then_with(|| a.subject.end.cmp(&b.subject.end))
}

/// Descending start positions within query-strand groups; subject frame is
/// ignored.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (s_RevCompareHSPs)
pub fn rev_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    query_strand_group(a, b)
        .then_with(|| b.query.offset.cmp(&a.query.offset))
        .then_with(|| b.subject.offset.cmp(&a.subject.offset))
}

/// Descending coordinates within query-strand then subject-frame-sign
/// groups. This is the order the even-gap engine links in; walking the
/// sorted array forward moves upstream through the query.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
/// ```c
/// /* Comparison function deliberately taking every coordinate into
///    account, so the linking pass sees a reproducible order. -cfj */
/// if (SIGN(h1->hsp->query.frame) != SIGN(h2->hsp->query.frame)) ...
/// if (SIGN(h1->hsp->subject.frame) != SIGN(h2->hsp->subject.frame)) ...
/// if (h1->hsp->query.offset < h2->hsp->query.offset) return 1;
/// if (h1->hsp->query.end < h2->hsp->query.end) return 1;
/// if (h1->hsp->subject.offset < h2->hsp->subject.offset) return 1;
/// if (h1->hsp->subject.end < h2->hsp->subject.end) return 1;
/// ```
pub fn rev_compare_hsps_cfj(a: &Hsp, b: &Hsp) -> Ordering {
    query_strand_group(a, b)
        .then_with(|| subject_strand_group(a, b))
        .then_with(|| b.query.offset.cmp(&a.query.offset))
        .then_with(|| b.query.end.cmp(&a.query.end))
        .then_with(|| b.subject.offset.cmp(&a.subject.offset))
        .then_with(|| b.subject.end.cmp(&a.subject.end))
}

/// Best chain score descending, the order the spliced engine consumes
/// candidates in.
///
/// NCBI reference: legacy blastutl.c
/// ```c
/// static int
/// sumscore_compare_hsps(VoidPtr v1, VoidPtr v2)
/// {
///     ...
///     score1 = MAX(h1->sumscore, h1->score);
///     score2 = MAX(h2->sumscore, h2->score);
///     if (score1 < score2)
///         return(1);
///     if (score1 > score2)
///         return(-1);
///     return(0);
/// }
/// ```
pub fn sumscore_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    b.best_score()
        .cmp(&a.best_score())
        .then_with(|| a.query.offset.cmp(&b.query.offset))
        .then_with(|| a.subject.offset.cmp(&b.subject.offset))
}

#[inline]
fn query_strand_group(a: &Hsp, b: &Hsp) -> Ordering {
    // Positive strand sorts first; frames of equal sign stay together
    b.query.strand().cmp(&a.query.strand())
}

#[inline]
fn subject_strand_group(a: &Hsp, b: &Hsp) -> Ordering {
    b.subject.strand().cmp(&a.subject.strand())
}
