use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::diagnostics::{self, DiagnosticOutcome, DiagnosticResult, tools::Toolbox};
use crate::extract;
use crate::probe::{fetch, versions};
use crate::report::record::ProbeRecord;
use crate::report::store::Report;

/// Upper bound on concurrently running pool diagnostics.
pub fn worker_pool_size() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 10).min(100)
}

/// Probe every instance and assemble the run's report.
///
/// The per-instance pipeline is strictly sequential; only the nmap and
/// tcptraceroute probes go to the bounded pool, and their results are merged
/// here as they complete, in completion order. Nothing an instance does can
/// abort the run.
pub async fn run(client: &Client, tools: &Toolbox, instances: &BTreeSet<String>) -> Report {
    let semaphore = Arc::new(Semaphore::new(worker_pool_size()));
    let mut pool: JoinSet<DiagnosticResult> = JoinSet::new();
    let mut report = Report::new();

    for instance in instances {
        log::info!("Checking {instance}");
        let starttime = Utc::now().timestamp();
        let started = Instant::now();

        let Some(record) = probe_instance(client, tools, instance, starttime, started).await
        else {
            // no config.js means no record for this run at all
            continue;
        };
        report.insert(instance.clone(), record);

        if let Some(host) = host_of(instance) {
            submit_pool_probes(&mut pool, &semaphore, tools, instance, &host);
        }
    }

    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(result) => merge(&mut report, result),
            Err(e) => log::warn!("A diagnostic task failed: {e}"),
        }
    }
    report
}

/// The sequential phase: config fetch and extraction (the short-circuit),
/// then best-effort logging config, versions, timing, TLS check and tlsping.
async fn probe_instance(
    client: &Client,
    tools: &Toolbox,
    instance: &str,
    starttime: i64,
    started: Instant,
) -> Option<ProbeRecord> {
    let fetched = fetch::fetch_script(client, tools, instance, "config.js").await;
    let body = fetched.body?;
    let config = extract::extract(tools, "config.js", &body).await?;

    let mut record = ProbeRecord::default();
    record.config = config;
    record.http_headers = fetched.http_headers;
    record.ip = fetched.ip;
    record.notes = fetched.notes;

    let logging = fetch::fetch_script(client, tools, instance, "logging_config.js").await;
    if let Some(body) = logging.body {
        record.logging_config = extract::extract(tools, "logging_config.js", &body).await;
    }

    record.versions = versions::fetch_versions(client, instance).await;
    record.starttime = Some(starttime);
    record.duration = Some(started.elapsed().as_secs_f64());

    if let Some(host) = host_of(instance) {
        record.tls = Some(diagnostics::tls::tls_version(&host).await);
        record.tlsping = diagnostics::tlsping::tlsping(tools, &host).await;
    }
    Some(record)
}

fn submit_pool_probes(
    pool: &mut JoinSet<DiagnosticResult>,
    semaphore: &Arc<Semaphore>,
    tools: &Toolbox,
    instance: &str,
    host: &str,
) {
    if tools.nmap.is_some() {
        let semaphore = Arc::clone(semaphore);
        let tools = tools.clone();
        let instance = instance.to_string();
        let host = host.to_string();
        pool.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            DiagnosticResult {
                instance,
                outcome: DiagnosticOutcome::SslEnumCiphers(
                    diagnostics::nmap::ssl_enum_ciphers(&tools, &host).await,
                ),
            }
        });
    }
    if tools.tcptraceroute.is_some() {
        let semaphore = Arc::clone(semaphore);
        let tools = tools.clone();
        let instance = instance.to_string();
        let host = host.to_string();
        pool.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            DiagnosticResult {
                instance,
                outcome: DiagnosticOutcome::Tcptraceroute(
                    diagnostics::traceroute::tcptraceroute(&tools, &host).await,
                ),
            }
        });
    }
}

/// Fold one completed diagnostic into its instance's record. Merging is
/// commutative, so completion order does not matter.
fn merge(report: &mut Report, result: DiagnosticResult) {
    let category = result.outcome.category();
    let Some(record) = report.get_mut(&result.instance) else {
        log::warn!("{}: no record to merge {category} into", result.instance);
        return;
    };
    match result.outcome {
        DiagnosticOutcome::SslEnumCiphers(Some(value)) => {
            record.ssl_enum_ciphers = Some(value);
        }
        DiagnosticOutcome::Tcptraceroute(Some(hops)) => {
            record.tcptraceroute = Some(hops);
        }
        // the probe produced nothing usable; leave the category absent
        DiagnosticOutcome::SslEnumCiphers(None) | DiagnosticOutcome::Tcptraceroute(None) => {}
    }
}

fn host_of(instance: &str) -> Option<String> {
    Url::parse(instance)
        .ok()?
        .host_str()
        .map(|host| host.to_string())
}
