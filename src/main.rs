use anyhow::Context;
use chrono::Utc;

use jitsi_monitor::config::{self, MonitorConfig};
use jitsi_monitor::diagnostics::tools::Toolbox;
use jitsi_monitor::{discovery, probe, report};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let monitor_config = MonitorConfig::from_env();
    let client =
        config::build_client(&monitor_config).context("failed to build the HTTP client")?;
    let tools = Toolbox::detect();
    log::info!("Available tools: {}", tools.summary());

    // captured once; every record and the history key use this run's time
    let timestamp = Utc::now().timestamp();

    let history = report::store::load_history(&client, &monitor_config).await;
    let instances = discovery::discover(&client, &monitor_config, &history)
        .await
        .context("instance discovery failed")?;
    log::info!("Probing {} instances", instances.len());

    let run_report = probe::runner::run(&client, &tools, &instances).await;
    let merged = report::store::write_report(&monitor_config, history, timestamp, run_report)
        .context("failed to write report.json")?;

    // the run's entry is the newest one, even if its timestamp was bumped
    let current = merged
        .values()
        .next_back()
        .context("history is empty after the run")?;
    report::html::write_html(&monitor_config, current).context("failed to write index.html")?;

    log::info!(
        "Wrote {} and {}",
        monitor_config.output_dir.join("report.json").display(),
        monitor_config.output_dir.join("index.html").display()
    );
    Ok(())
}
