//! Tool-gated network diagnostics and their result plumbing.
//!
//! Each probe tolerates its external tool being absent entirely: that
//! category is simply omitted from the record. Probe failures are data
//! (error strings in the record), never run-aborting errors.

pub mod nmap;
pub mod tls;
pub mod tlsping;
pub mod tools;
pub mod traceroute;

use serde_json::Value;

use crate::report::record::Hop;

/// A completed pool-dispatched diagnostic, tagged with its instance so the
/// merge step is order-independent. `None` payloads mean "nothing usable",
/// distinct from tool errors which arrive as data inside the payload.
#[derive(Debug)]
pub struct DiagnosticResult {
    pub instance: String,
    pub outcome: DiagnosticOutcome,
}

#[derive(Debug)]
pub enum DiagnosticOutcome {
    SslEnumCiphers(Option<Value>),
    Tcptraceroute(Option<Vec<Hop>>),
}

impl DiagnosticOutcome {
    pub fn category(&self) -> &'static str {
        match self {
            DiagnosticOutcome::SslEnumCiphers(_) => "ssl-enum-ciphers",
            DiagnosticOutcome::Tcptraceroute(_) => "tcptraceroute",
        }
    }
}
