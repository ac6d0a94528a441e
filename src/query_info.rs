//! Inputs a linking pass reads but never mutates: program type, per-context
//! query layout, Karlin blocks and the subject sequence.

use crate::stats::KarlinBlk;

/// Program type, deciding translation handling and engine routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlastProgram {
    Blastn,
    Blastp,
    Blastx,
    Tblastn,
    Tblastx,
    PsiTblastn,
}

impl BlastProgram {
    /// Subject coordinates and lengths are nucleotide and get divided by
    /// [`CODON_LENGTH`](crate::params::CODON_LENGTH) for statistics.
    ///
    /// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_program.c
    /// (Blast_SubjectIsTranslated)
    pub fn subject_is_translated(self) -> bool {
        matches!(self, BlastProgram::Tblastn | BlastProgram::Tblastx | BlastProgram::PsiTblastn)
    }

    pub fn query_is_translated(self) -> bool {
        matches!(self, BlastProgram::Blastx | BlastProgram::Tblastx)
    }

    /// Programs whose subject-side gaps can be introns. Only these route to
    /// the spliced engine (and only when `longest_intron > 0`).
    pub fn supports_spliced_linking(self) -> bool {
        matches!(self, BlastProgram::Tblastn | BlastProgram::PsiTblastn)
    }
}

/// One query context (one frame of one query). Lengths are frame-local:
/// for translated queries they are residue counts, not nucleotides.
///
/// Reference: ncbi-blast/c++/include/algo/blast/core/blast_query_info.h
/// (BlastContextInfo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextInfo {
    /// Start of this context in the concatenated query.
    pub query_offset: i32,
    pub query_length: i32,
    /// Effective search space for this context.
    pub eff_searchsp: i64,
    pub length_adjustment: i32,
}

#[derive(Debug, Clone, Default)]
pub struct QueryInfo {
    pub contexts: Vec<ContextInfo>,
}

impl QueryInfo {
    pub fn new(contexts: Vec<ContextInfo>) -> Self {
        QueryInfo { contexts }
    }

    /// Single-context layout, the common case in tests and simple callers.
    pub fn single(query_length: i32, eff_searchsp: i64, length_adjustment: i32) -> Self {
        QueryInfo {
            contexts: vec![ContextInfo {
                query_offset: 0,
                query_length,
                eff_searchsp,
                length_adjustment,
            }],
        }
    }
}

/// Karlin blocks per context, ungapped and gapped, plus the score scale.
#[derive(Debug, Clone)]
pub struct ScoreBlk {
    pub kbp: Vec<KarlinBlk>,
    pub kbp_gap: Vec<KarlinBlk>,
    /// Multiplier applied to cutoff scores when scores are scaled up
    /// (composition-based statistics); 1.0 otherwise.
    pub scale_factor: f64,
}

impl Default for ScoreBlk {
    fn default() -> Self {
        ScoreBlk { kbp: Vec::new(), kbp_gap: Vec::new(), scale_factor: 1.0 }
    }
}

impl ScoreBlk {
    pub fn new(kbp: Vec<KarlinBlk>, kbp_gap: Vec<KarlinBlk>) -> Self {
        ScoreBlk { kbp, kbp_gap, scale_factor: 1.0 }
    }

    /// The per-context blocks a pass should score with.
    ///
    /// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
    /// `kbp = (gapped_calculation ? sbp->kbp_gap : sbp->kbp);`
    pub fn kbp_for(&self, gapped: bool) -> &[KarlinBlk] {
        if gapped {
            &self.kbp_gap
        } else {
            &self.kbp
        }
    }
}

/// 4-bit nucleotide codes (ncbi4na).
pub const NCBI4NA_A: u8 = 1;
pub const NCBI4NA_C: u8 = 2;
pub const NCBI4NA_G: u8 = 4;
pub const NCBI4NA_T: u8 = 8;

/// Subject sequence handed to a linking pass. `length` is the nucleotide
/// length used by the statistics; `sequence` (ncbi4na, one base per byte)
/// is only consulted by the spliced engine's junction scan and may be
/// empty for even-gap callers.
#[derive(Debug, Clone, Default)]
pub struct SubjectBlk {
    pub sequence: Vec<u8>,
    pub length: i32,
}

impl SubjectBlk {
    pub fn new(sequence: Vec<u8>, length: i32) -> Self {
        SubjectBlk { sequence, length }
    }

    /// Statistics-only subject with no residues attached.
    pub fn with_length(length: i32) -> Self {
        SubjectBlk { sequence: Vec::new(), length }
    }
}
