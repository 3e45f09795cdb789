use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

use reqwest::Client;
use tempfile::NamedTempFile;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::report::record::ProbeRecord;

/// All probe records produced by one run, keyed by instance URL.
pub type Report = BTreeMap<String, ProbeRecord>;

/// Every past report, keyed by run start timestamp. Integer keys serialize
/// as decimal strings in JSON and parse back to integers; the BTreeMap keeps
/// them sorted on write.
pub type History = BTreeMap<i64, Report>;

/// Fetch the previously published history, if publishing is configured.
///
/// A missing or unreachable endpoint is not an error; the run just starts
/// with an empty history.
pub async fn load_history(client: &Client, config: &MonitorConfig) -> History {
    let Some(url) = config.history_url() else {
        return History::new();
    };
    log::info!("Loading history from {url}");
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<History>().await {
                Ok(history) => history,
                Err(e) => {
                    log::warn!("History at {url} is not parseable: {e}");
                    History::new()
                }
            }
        }
        Ok(response) => {
            log::warn!("History fetch returned {}", response.status());
            History::new()
        }
        Err(e) => {
            log::warn!("History fetch failed: {e}");
            History::new()
        }
    }
}

/// Append the run's report under its timestamp and rewrite report.json.
///
/// Past entries are never touched. The file is written to a temp file in the
/// output directory and renamed into place, so readers never see a torn
/// report.
pub fn write_report(
    config: &MonitorConfig,
    mut history: History,
    mut timestamp: i64,
    report: Report,
) -> Result<History> {
    if let Some(&last) = history.keys().next_back() {
        // keep timestamps strictly increasing even under clock skew
        if timestamp <= last {
            log::warn!("Run timestamp {timestamp} is not after {last}; bumping");
            timestamp = last + 1;
        }
    }
    history.insert(timestamp, report);

    fs::create_dir_all(&config.output_dir)?;
    let mut file = NamedTempFile::new_in(&config.output_dir)?;
    serde_json::to_writer(&mut file, &history)?;
    file.flush()?;
    file.persist(config.output_dir.join("report.json"))
        .map_err(|e| e.error)?;
    Ok(history)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn record(domain: &str) -> ProbeRecord {
        let mut r = ProbeRecord::default();
        r.config = json!({"hosts": {"domain": domain}});
        r
    }

    #[test]
    fn history_keys_round_trip_as_integers() {
        let mut history = History::new();
        let mut report = Report::new();
        report.insert("https://meet.example.org".to_string(), record("meet.example.org"));
        history.insert(1_700_000_000, report);

        let text = serde_json::to_string(&history).unwrap();
        // JSON object keys are strings on the wire
        assert!(text.contains("\"1700000000\""));

        let back: History = serde_json::from_str(&text).unwrap();
        assert_eq!(back, history);
        assert!(back.contains_key(&1_700_000_000));
    }

    #[test]
    fn appending_a_run_leaves_past_entries_untouched() {
        let mut history = History::new();
        let mut t1 = Report::new();
        t1.insert("https://a.example".to_string(), record("a.example"));
        let mut t2 = Report::new();
        t2.insert("https://b.example".to_string(), record("b.example"));
        history.insert(100, t1.clone());
        history.insert(200, t2.clone());

        let mut t3 = Report::new();
        t3.insert("https://a.example".to_string(), record("a.example"));

        let config = MonitorConfig {
            pages_url: None,
            project_path: None,
            project_url: None,
            user_agent: "test".to_string(),
            seed_path: "README.md".into(),
            output_dir: tempfile::tempdir().unwrap().keep(),
        };
        let merged = write_report(&config, history, 300, t3.clone()).unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[&100], t1);
        assert_eq!(merged[&200], t2);
        assert_eq!(merged[&300], t3);

        // and the file on disk reads back identically
        let text = fs::read_to_string(config.output_dir.join("report.json")).unwrap();
        let back: History = serde_json::from_str(&text).unwrap();
        assert_eq!(back, merged);
    }

    #[test]
    fn stale_run_timestamp_is_bumped_past_the_newest_entry() {
        let mut history = History::new();
        history.insert(500, Report::new());
        let config = MonitorConfig {
            pages_url: None,
            project_path: None,
            project_url: None,
            user_agent: "test".to_string(),
            seed_path: "README.md".into(),
            output_dir: tempfile::tempdir().unwrap().keep(),
        };
        let merged = write_report(&config, history, 500, Report::new()).unwrap();
        assert_eq!(merged.keys().copied().collect::<Vec<_>>(), vec![500, 501]);
    }

    #[test]
    fn timestamps_are_sorted_on_write() {
        let mut history = History::new();
        history.insert(300, Report::new());
        history.insert(100, Report::new());
        history.insert(200, Report::new());
        let text = serde_json::to_string(&history).unwrap();
        let p100 = text.find("\"100\"").unwrap();
        let p200 = text.find("\"200\"").unwrap();
        let p300 = text.find("\"300\"").unwrap();
        assert!(p100 < p200 && p200 < p300);
    }
}
