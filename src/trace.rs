//! Targeted HSP tracing, enabled by environment variable.
//!
//! `HSPLINK_TRACE_HSP="qoff,qend,soff,send"` names one HSP by its raw
//! coordinates; the linking engines report that HSP's chain decisions to
//! stderr. The variable is parsed once; when unset the only cost is a
//! OnceLock read.

use std::sync::OnceLock;

use crate::hsp::Hsp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TraceHspTarget {
    pub q_offset: i32,
    pub q_end: i32,
    pub s_offset: i32,
    pub s_end: i32,
}

static TRACE_HSP_TARGET: OnceLock<Option<TraceHspTarget>> = OnceLock::new();

fn parse_target(raw: &str) -> Option<TraceHspTarget> {
    let mut fields = raw.split(',').map(|f| f.trim().parse::<i32>().ok());
    let q_offset = fields.next()??;
    let q_end = fields.next()??;
    let s_offset = fields.next()??;
    let s_end = fields.next()??;
    Some(TraceHspTarget { q_offset, q_end, s_offset, s_end })
}

pub(crate) fn trace_hsp_target() -> Option<TraceHspTarget> {
    *TRACE_HSP_TARGET.get_or_init(|| {
        let raw = std::env::var("HSPLINK_TRACE_HSP").ok()?;
        let target = parse_target(&raw);
        if target.is_none() {
            eprintln!("[hsplink] ignoring malformed HSPLINK_TRACE_HSP={raw:?}");
        }
        target
    })
}

pub(crate) fn matches_target(hsp: &Hsp) -> bool {
    match trace_hsp_target() {
        Some(t) => {
            hsp.query.offset == t.q_offset
                && hsp.query.end == t.q_end
                && hsp.subject.offset == t.s_offset
                && hsp.subject.end == t.s_end
        }
        None => false,
    }
}
