//! HSP records and the arena they live in.
//!
//! Linked-set bookkeeping lives directly on the HSP: a two-slot
//! [`HspLink`] working structure for the even-gap engine, chain flags and
//! intrusive `prev`/`next` indices. All cross-references are positions in
//! the owning [`HspList`] vector, which keeps its length through a linking
//! pass and is permuted once at the end.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (LinkHSPStruct,
//! BlastHSPLink) and blast_hits.h (BlastHSP).

use crate::params::TRIM_SIZE;

/// One side of an HSP, in frame-local half-open coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlastSeg {
    /// Reading frame; the sign is the strand, 0 means plain nucleotide.
    pub frame: i16,
    pub offset: i32,
    pub end: i32,
    /// Start shrunk inward by `min(length/4, 5)`; set by [`set_trims`].
    ///
    /// [`set_trims`]: BlastSeg::set_trims
    pub offset_trim: i32,
    /// End shrunk inward by the same amount.
    pub end_trim: i32,
}

impl BlastSeg {
    pub fn new(frame: i16, offset: i32, end: i32) -> Self {
        BlastSeg { frame, offset, end, offset_trim: 0, end_trim: 0 }
    }

    /// Trimmed coordinates used by the even-gap window tests.
    ///
    /// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c:556-567
    /// ```c
    /// H->q_offset_trim = H->hsp->query.offset +
    ///     MIN(((H->hsp->query.end - H->hsp->query.offset) / 4), 5);
    /// ```
    pub fn set_trims(&mut self) {
        let trim = ((self.end - self.offset) / 4).min(TRIM_SIZE);
        self.offset_trim = self.offset + trim;
        self.end_trim = self.end - trim;
    }

    #[inline]
    pub fn strand(&self) -> i16 {
        self.frame.signum()
    }
}

/// Which gap model won a chain in the even-gap engine. The spliced engine
/// records its chains as [`LargeGap`](OrderingMethod::LargeGap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMethod {
    SmallGap,
    LargeGap,
}

impl OrderingMethod {
    /// Slot in the two-element [`HspLink`] arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            OrderingMethod::SmallGap => 0,
            OrderingMethod::LargeGap => 1,
        }
    }

    pub const BOTH: [OrderingMethod; 2] = [OrderingMethod::SmallGap, OrderingMethod::LargeGap];
}

/// Per-HSP working state of the even-gap engine, one slot per gap model.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (BlastHSPLink)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HspLink {
    /// Next chain member downstream, per model.
    pub link: [Option<usize>; 2],
    /// Chain length counting this HSP and everything it links to.
    pub num: [i16; 2],
    /// Cutoff-adjusted running sum score.
    pub sum: [i32; 2],
    /// Running normalized score, `sum of (lambda*score - ln K)`.
    pub xsum: [f64; 2],
    /// Set when the fields must be recomputed on the next pass.
    pub changed: bool,
}

impl Default for HspLink {
    fn default() -> Self {
        HspLink { link: [None; 2], num: [1; 2], sum: [0; 2], xsum: [0.0; 2], changed: true }
    }
}

/// Marker meaning "already extracted into a final chain". Any candidate
/// whose link path reaches a poisoned HSP is stale.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c:100
/// `#define BLAST_HSP_LINKED -1000` (via linked_to bookkeeping)
pub const LINKED_TO_REMOVED: i32 = -1000;

/// A high-scoring segment pair plus its linking state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsp {
    /// Raw alignment score.
    pub score: i32,
    pub query: BlastSeg,
    pub subject: BlastSeg,
    /// Query context index into [`QueryInfo`](crate::query_info::QueryInfo).
    pub context: usize,
    /// Expect value; a linking pass overwrites it with the chain value.
    pub evalue: f64,
    /// Chain size, 1 for singletons.
    pub num: i16,
    /// Chain sum score; meaningful once `num > 1`.
    pub sum_score: i32,
    /// Gap model that produced the chain, `None` before linking.
    pub ordering_method: Option<OrderingMethod>,
    /// Signed splice evidence from the spliced engine: +1 per adjacent
    /// pair with a consistent GT..AG junction, -1 per pair without.
    pub splice_quality: i32,
    /// Member of a chain with two or more HSPs.
    pub linked_set: bool,
    /// Head of its chain.
    pub start_of_chain: bool,
    /// Working in-degree; [`LINKED_TO_REMOVED`] once extracted.
    pub linked_to: i32,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub hsp_link: HspLink,
}

impl Hsp {
    pub fn new(score: i32, query: BlastSeg, subject: BlastSeg, context: usize) -> Self {
        Hsp {
            score,
            query,
            subject,
            context,
            evalue: 0.0,
            num: 1,
            sum_score: 0,
            ordering_method: None,
            splice_quality: 0,
            linked_set: false,
            start_of_chain: false,
            linked_to: 0,
            prev: None,
            next: None,
            hsp_link: HspLink::default(),
        }
    }

    /// Chain sum where present, otherwise the HSP's own score.
    #[inline]
    pub fn best_score(&self) -> i32 {
        self.sum_score.max(self.score)
    }
}

/// The arena a linking pass works over. Indices stored in `prev`, `next`
/// and the link slots refer to positions in `hsps`.
#[derive(Debug, Clone, Default)]
pub struct HspList {
    pub hsps: Vec<Hsp>,
}

impl HspList {
    pub fn new(hsps: Vec<Hsp>) -> Self {
        HspList { hsps }
    }

    pub fn len(&self) -> usize {
        self.hsps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }
}
