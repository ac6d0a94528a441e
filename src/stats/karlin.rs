//! Karlin-Altschul parameter blocks and the plain score-to-E conversion.

/// One context's Karlin-Altschul parameters. `log_k` is cached so the
/// linking loops never take `ln` per HSP.
///
/// Reference: ncbi-blast/c++/include/algo/blast/core/blast_stat.h (Blast_KarlinBlk)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinBlk {
    pub lambda: f64,
    pub k: f64,
    pub log_k: f64,
    pub h: f64,
}

impl KarlinBlk {
    pub fn new(lambda: f64, k: f64, h: f64) -> Self {
        KarlinBlk { lambda, k, log_k: k.ln(), h }
    }
}

impl Default for KarlinBlk {
    /// Stock ungapped protein values (BLOSUM62).
    fn default() -> Self {
        KarlinBlk::new(0.3176, 0.134, 0.4012)
    }
}

/// Bit score from a raw score: `S' = (lambda * S - ln K) / ln 2`.
///
/// Reference: ncbi-blast/c++/src/algo/blast/core/blast_kappa.c:113
/// hsp->bit_score = (hsp->score*lambda*scoreDivisor - logK)/NCBIMATH_LN2;
pub fn bit_score(raw_score: i32, kbp: &KarlinBlk) -> f64 {
    (kbp.lambda * (raw_score as f64) - kbp.log_k) / std::f64::consts::LN_2
}

/// E-value of a single raw score over a search space, no edge corrections.
///
/// Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (BLAST_KarlinStoE_simple)
/// return (double) searchsp * exp((double)(-Lambda * S) + kbp->logK);
pub fn karlin_stoe_simple(score: i32, kbp: &KarlinBlk, searchsp: i64) -> f64 {
    if kbp.lambda < 0.0 || kbp.k < 0.0 || kbp.h < 0.0 {
        return -1.0;
    }
    (searchsp as f64) * (-kbp.lambda * (score as f64) + kbp.log_k).exp()
}
