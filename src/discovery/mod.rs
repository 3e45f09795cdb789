//! Builds the per-run instance set from the seed document's source lists
//! plus every instance already present in published history.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use reqwest::Client;
use tokio::fs;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::report::store::History;

const SOURCE_LISTS_HEADING: &str = "# Source Lists";

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\*\s*").unwrap());
static INSTANCE_URL: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"(?i)https?://[a-z0-9.-]{3,}").unwrap());

/// Source-list page URLs from the seed document: every non-blank line after
/// the `# Source Lists` heading, stripped of its leading bullet.
pub fn source_urls(seed: &str) -> Vec<String> {
    let Some(position) = seed.find(SOURCE_LISTS_HEADING) else {
        log::warn!("Seed document has no `{SOURCE_LISTS_HEADING}` section");
        return Vec::new();
    };
    let rest = &seed[position + SOURCE_LISTS_HEADING.len()..];
    rest.lines()
        .filter(|line| !line.is_empty())
        .map(|line| BULLET.replace(line, "").into_owned())
        .collect()
}

/// Scan raw page bytes for instance URL prefixes. Plaintext is never probed,
/// so every `http://` match is normalized to `https://`.
pub fn scan_instances(bytes: &[u8], instances: &mut BTreeSet<String>) {
    for found in INSTANCE_URL.find_iter(bytes) {
        if let Ok(url) = std::str::from_utf8(found.as_bytes()) {
            // the scheme is http or https in any case mix; force https
            if let Some((_, rest)) = url.split_once("://") {
                instances.insert(format!("https://{rest}"));
            }
        }
    }
}

/// Produce the deduplicated, sorted set of candidate instances for this run.
///
/// A source page that fails to fetch contributes nothing and the run
/// continues; an empty final set is the one fatal precondition.
pub async fn discover(
    client: &Client,
    config: &MonitorConfig,
    history: &History,
) -> Result<BTreeSet<String>> {
    let mut instances = BTreeSet::new();
    for report in history.values() {
        for url in report.keys() {
            instances.insert(url.clone());
        }
    }

    let seed = fs::read_to_string(&config.seed_path).await?;
    for source in source_urls(&seed) {
        log::info!("Scanning source list {source}");
        match client.get(&source).send().await {
            Ok(response) if response.status().is_success() => match response.bytes().await {
                Ok(body) => scan_instances(&body, &mut instances),
                Err(e) => log::warn!("Reading {source} failed: {e}"),
            },
            Ok(response) => {
                log::warn!("Skipping {source}: status {}", response.status());
            }
            Err(e) => log::warn!("Skipping {source}: {e}"),
        }
    }

    if instances.is_empty() {
        return Err(MonitorError::NoInstances);
    }
    Ok(instances)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn source_urls_come_from_the_section_bullets() {
        let seed = "\
# Jitsi Monitor

Probes public instances.

# Source Lists

* https://example.org/instances.md
  * https://example.net/list.html
https://bare.example.com/page
";
        assert_eq!(
            source_urls(seed),
            vec![
                "https://example.org/instances.md",
                "https://example.net/list.html",
                "https://bare.example.com/page",
            ]
        );
    }

    #[test]
    fn missing_section_yields_no_sources() {
        assert!(source_urls("# Something Else\n* https://example.org\n").is_empty());
    }

    #[test]
    fn scanner_extracts_and_normalizes_instance_urls() {
        let page = b"<ul><li><a href=\"https://meet.example.org/about\">x</a>\
<li>HTTP://meet.other.example:8443/\
<li>http://plain.example.net</ul>";
        let mut instances = BTreeSet::new();
        scan_instances(page, &mut instances);
        let found: Vec<&str> = instances.iter().map(String::as_str).collect();
        assert_eq!(
            found,
            vec![
                "https://meet.example.org",
                "https://meet.other.example",
                "https://plain.example.net",
            ]
        );
    }

    #[test]
    fn too_short_hosts_are_not_matched() {
        let mut instances = BTreeSet::new();
        scan_instances(b"see http://ab and https://x.y for details", &mut instances);
        assert_eq!(instances.len(), 1);
        assert!(instances.contains("https://x.y"));
    }
}
