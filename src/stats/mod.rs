pub mod karlin;
pub mod sum_statistics;

pub use karlin::{bit_score, karlin_stoe_simple, KarlinBlk};
pub use sum_statistics::{
    blast_sum_p, e_to_p, gap_decay_divisor, large_gap_sum_e, ln_factorial, ln_gamma_int,
    normalize_score, p_to_e, small_gap_sum_e, uneven_gap_sum_e,
};
