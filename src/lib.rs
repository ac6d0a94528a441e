pub mod hsp;
pub mod ordering;
pub mod params;
pub mod query_info;
pub mod stats;

// Linking engines and their entry point (matching NCBI BLAST structure)
pub mod link;

mod trace;
