//! Supplemental endpoints outside the two core pipelines.
//!
//! Trivial responders (geo, robots) answer entirely at the edge; the media
//! passthrough is a single host rewrite with an origin fallback. None of
//! them consult the decision service or the proxy gate.

pub mod media;
pub mod originless;

pub use media::MediaPassthrough;
