use std::fmt::Write as _;
use std::fs;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::report::store::Report;

/// Render the static index page: a header, links to the JSON report and the
/// source repository, and the current run's report pretty-printed.
pub fn render(config: &MonitorConfig, report: &Report) -> Result<String> {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\"><head><title>Jitsi Monitor</title>");
    page.push_str("<meta charset=\"utf-8\"><link rel=\"stylesheet\" href=\"main.css\">");
    page.push_str("</head><body><div class=\"site-wrapper\"><header class=\"site-header\">");
    page.push_str("<a class=\"site-title\" href=\"https://guardianproject.info\">");
    let _ = write!(
        page,
        "<img src=\"logo.png\"><h1>{}</h1></a></header>",
        config.project_path.as_deref().unwrap_or("")
    );
    page.push_str("<div class=\"main-content-with-sidebar\"><div class=\"article-area\">");
    page.push_str("<h2>Jitsi Monitor</h2>");
    page.push_str(
        "<p>Get the full history as JSON: <a href=\"report.json\">report.json</a></p>",
    );
    if let Some(source_url) = &config.project_url {
        let _ = write!(page, "<p>Source code:<a href=\"{source_url}\">{source_url}</a></p>");
    }
    page.push_str("<pre>");
    page.push_str(&serde_json::to_string_pretty(report)?);
    page.push_str("</pre>");
    page.push_str("</div></div></div></body></html>");
    Ok(page)
}

/// Write index.html into the output directory.
pub fn write_html(config: &MonitorConfig, report: &Report) -> Result<()> {
    fs::create_dir_all(&config.output_dir)?;
    fs::write(config.output_dir.join("index.html"), render(config, report)?)?;
    Ok(())
}
