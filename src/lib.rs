//! Probes public Jitsi Meet instances: discovers them from seed source
//! lists, extracts their client-side JavaScript configuration, runs TLS and
//! network diagnostics, and accumulates everything into a timestamp-keyed
//! historical report.

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod probe;
pub mod report;
