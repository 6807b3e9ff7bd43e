//! Outbound link discovery and reachability checking.
//!
//! Candidates are harvested from a parsed page, then probed through the
//! shared link cache. Unreachable verdicts are cached the same as reachable
//! ones so a dead link is not re-probed within the TTL.

mod candidates;
mod validator;

pub use candidates::{LinkCandidate, LinkKind, collect_candidates};
pub use validator::{HttpProber, LinkTally, LinkValidator, Prober, ValidatorConfig};
