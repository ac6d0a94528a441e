//! Linking parameters and the cutoff-score derivation.

use crate::query_info::{BlastProgram, QueryInfo, ScoreBlk};
use crate::stats::sum_statistics::defaults;
use crate::stats::KarlinBlk;

/// Largest gap between linked HSPs under the small-gap model.
///
/// NCBI reference: ncbi-blast/c++/include/algo/blast/core/blast_parameters.h
/// `#define BLAST_GAP_SIZE 40`
pub const GAP_SIZE: i32 = 40;

/// Largest overlap between successive linked HSPs.
/// `#define BLAST_OVERLAP_SIZE 9`
pub const OVERLAP_SIZE: i32 = 9;

/// Inward trim bound used when comparing HSP endpoints.
pub const TRIM_SIZE: i32 = (OVERLAP_SIZE + 1) / 2;

pub const CODON_LENGTH: i32 = 3;

/// Tunables of both linking engines.
///
/// Reference: ncbi-blast/c++/include/algo/blast/core/blast_parameters.h
/// (BlastLinkHSPParameters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkHspParams {
    /// Prior probability that a chain has small gaps.
    pub gap_prob: f64,
    pub gap_size: i32,
    pub overlap_size: i32,
    /// Decay rate for the sum E-value weight.
    pub gap_decay_rate: f64,
    /// Sum score cutoff for the small-gap model; 0 disables it.
    pub cutoff_small_gap: i32,
    /// Sum score cutoff for the large-gap model.
    pub cutoff_big_gap: i32,
    /// Longest allowed intron; positive values route tblastn-style
    /// searches to the spliced engine.
    pub longest_intron: i32,
}

impl LinkHspParams {
    pub fn new(gapped: bool) -> Self {
        let (gap_prob, gap_decay_rate) = if gapped {
            (defaults::GAP_PROB_GAPPED, defaults::GAP_DECAY_RATE_GAPPED)
        } else {
            (defaults::GAP_PROB_UNGAPPED, defaults::GAP_DECAY_RATE_UNGAPPED)
        };
        LinkHspParams {
            gap_prob,
            gap_size: GAP_SIZE,
            overlap_size: OVERLAP_SIZE,
            gap_decay_rate,
            cutoff_small_gap: 0,
            cutoff_big_gap: 0,
            longest_intron: 0,
        }
    }

    /// Window for the small-gap model, in trimmed coordinates.
    #[inline]
    pub fn small_gap_window(&self) -> i32 {
        self.gap_size + self.overlap_size + 1
    }

    /// The small-gap model runs only when its cutoff was derived.
    ///
    /// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
    /// `ignore_small_gaps = (cutoff[0] == 0);`
    #[inline]
    pub fn ignore_small_gaps(&self) -> bool {
        self.cutoff_small_gap == 0
    }
}

impl Default for LinkHspParams {
    fn default() -> Self {
        LinkHspParams::new(false)
    }
}

/// Hit-saving options relevant to linking.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitSavingParams {
    pub link_hsp_params: LinkHspParams,
}

impl HitSavingParams {
    pub fn new(link_hsp_params: LinkHspParams) -> Self {
        HitSavingParams { link_hsp_params }
    }
}

/// Nearest integer, away from zero on exact halves.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c (BLAST_Nint)
pub fn blast_nint(x: f64) -> i32 {
    if x >= 0.0 {
        (x + 0.5) as i32
    } else {
        (x - 0.5) as i32
    }
}

/// Smallest positive lambda across contexts; that context's block drives
/// the cutoff derivation.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_parameters.c
/// (s_BlastFindSmallestLambda)
pub fn find_smallest_lambda(kbps: &[KarlinBlk]) -> Option<&KarlinBlk> {
    kbps.iter()
        .filter(|kbp| kbp.lambda > 0.0)
        .min_by(|a, b| a.lambda.total_cmp(&b.lambda))
}

/// Average query length over the concatenated context layout.
pub fn average_query_length(query_info: &QueryInfo) -> i32 {
    let Some(last) = query_info.contexts.last() else { return 1 };
    ((last.query_offset + last.query_length - 1) / query_info.contexts.len() as i32).max(1)
}

/// Derive the sum-score cutoffs for HSP linking. Mutates `cutoff_small_gap`,
/// `cutoff_big_gap` and possibly `gap_prob` in `link_hsp_params`.
///
/// The search space is compared against `8 * window^2`: only when the
/// sequences are large relative to the window is the small-gap test worth
/// running, and the cutoffs are then split between the two models by
/// `gap_prob`. Otherwise the small-gap model is disabled by a zero cutoff.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_parameters.c
/// (CalculateLinkHSPCutoffs)
pub fn calculate_link_hsp_cutoffs(
    program: BlastProgram,
    query_info: &QueryInfo,
    sbp: &ScoreBlk,
    link_hsp_params: &mut LinkHspParams,
    cutoff_score_min: i32,
    db_length: i64,
    subject_length: i32,
) {
    const K_EPSILON: f64 = 1.0e-9;

    let Some(kbp) = find_smallest_lambda(&sbp.kbp) else { return };

    let mut query_length = average_query_length(query_info);
    let mut subject_length = subject_length;
    let mut db_length = db_length;

    let gap_prob = link_hsp_params.gap_prob;
    let gap_decay_rate = link_hsp_params.gap_decay_rate;
    let window_size = link_hsp_params.small_gap_window();

    if program.subject_is_translated() {
        subject_length /= CODON_LENGTH;
        db_length /= CODON_LENGTH as i64;
    }

    // Subtract off the expected score
    let expected_length =
        blast_nint((kbp.k * (query_length as f64) * (subject_length as f64)).ln() / kbp.h);
    query_length = (query_length - expected_length).max(1);
    subject_length = (subject_length - expected_length).max(1);

    let y_variable = if db_length > subject_length as i64 {
        ((db_length as f64) / (subject_length as f64)).ln() * kbp.k / gap_decay_rate
    } else {
        (((subject_length + expected_length) as f64) / (subject_length as f64)).ln() * kbp.k
            / gap_decay_rate
    };

    let search_sp = (query_length as i64) * (subject_length as i64);
    let mut x_variable = 0.25 * y_variable * (search_sp as f64);

    if search_sp > 8 * (window_size as i64) * (window_size as i64) {
        x_variable /= 1.0 - gap_prob + K_EPSILON;
        link_hsp_params.cutoff_big_gap = (x_variable.ln() / kbp.lambda).floor() as i32 + 1;
        x_variable = y_variable * ((window_size * window_size) as f64);
        x_variable /= gap_prob + K_EPSILON;
        link_hsp_params.cutoff_small_gap =
            cutoff_score_min.max((x_variable.ln() / kbp.lambda).floor() as i32 + 1);
    } else {
        link_hsp_params.gap_prob = 0.0;
        link_hsp_params.cutoff_big_gap = (x_variable.ln() / kbp.lambda).floor() as i32 + 1;
        // Zero cutoff doubles as the ignore_small_gaps flag
        link_hsp_params.cutoff_small_gap = 0;
    }

    link_hsp_params.cutoff_big_gap *= sbp.scale_factor as i32;
    link_hsp_params.cutoff_small_gap *= sbp.scale_factor as i32;
}
