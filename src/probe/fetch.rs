use std::error::Error as _;
use std::fmt::Write as _;

use reqwest::{Client, StatusCode, header::HeaderMap};
use serde_json::{Map, Value, json};
use tokio::process::Command;

use crate::diagnostics::tools::Toolbox;

/// Bodies shorter than this from the curl fallback are considered noise.
const MIN_FALLBACK_BYTES: usize = 10;

/// What one script fetch yielded: the body when there was one, connection
/// metadata when the primary client answered, and any error-kind notes
/// destined for the record's open bucket.
#[derive(Debug, Default)]
pub struct FetchedScript {
    pub body: Option<String>,
    pub http_headers: Option<Map<String, Value>>,
    pub ip: Option<String>,
    pub notes: Map<String, Value>,
}

/// Fetch `<base>/<name>` and capture response metadata.
///
/// A certificate-validation failure is recorded as a note and retried once
/// through plain curl with validation disabled; a body obtained that way is
/// flagged `fetchedViaFallback`. Every other failure just means no body.
pub async fn fetch_script(
    client: &Client,
    tools: &Toolbox,
    base: &str,
    name: &str,
) -> FetchedScript {
    let url = format!("{}/{}", base.trim_end_matches('/'), name);
    let mut fetched = FetchedScript::default();

    match client.get(&url).send().await {
        Ok(response) if response.status() == StatusCode::OK => {
            fetched.http_headers = Some(headers_to_map(response.headers()));
            fetched.ip = response.remote_addr().map(|addr| addr.ip().to_string());
            match response.text().await {
                Ok(body) if !body.is_empty() => fetched.body = Some(body),
                Ok(_) => log::info!("{url}: empty body"),
                Err(e) => log::warn!("{url}: reading body failed: {e}"),
            }
        }
        Ok(response) => {
            log::info!("{url}: status {}", response.status());
        }
        Err(e) if is_certificate_error(&e) => {
            log::warn!("{url}: certificate error: {e}");
            fetched
                .notes
                .insert("certificateError".to_string(), json!(error_chain(&e)));
            if let Some(body) = curl_fallback(tools, &url).await {
                if body.len() > MIN_FALLBACK_BYTES {
                    fetched
                        .notes
                        .insert("fetchedViaFallback".to_string(), json!(true));
                    fetched.body = Some(body);
                }
            }
        }
        Err(e) => log::warn!("{url}: fetch failed: {e}"),
    }
    fetched
}

/// Last-resort retrieval through the system curl, which does not insist on
/// a valid certificate chain.
async fn curl_fallback(tools: &Toolbox, url: &str) -> Option<String> {
    let curl = tools.curl.as_ref()?;
    let target = tempfile::NamedTempFile::new().ok()?;
    log::info!(
        "# {} --silent --insecure --connect-timeout 60 -o {} {url}",
        curl.display(),
        target.path().display()
    );
    let status = Command::new(curl)
        .args(["--silent", "--insecure", "--connect-timeout", "60", "-o"])
        .arg(target.path())
        .arg(url)
        .status()
        .await;
    match status {
        Ok(status) if status.success() => tokio::fs::read_to_string(target.path()).await.ok(),
        Ok(status) => {
            log::warn!("{url}: curl exited with {status}");
            None
        }
        Err(e) => {
            log::warn!("{url}: curl invocation failed: {e}");
            None
        }
    }
}

fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        map.insert(
            name.as_str().to_string(),
            json!(String::from_utf8_lossy(value.as_bytes())),
        );
    }
    map
}

fn is_certificate_error(error: &reqwest::Error) -> bool {
    error_chain(error).to_lowercase().contains("certificate")
}

/// Render an error with its full source chain, one cause per line.
fn error_chain(error: &reqwest::Error) -> String {
    let mut text = format!("{error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(text, "\nCaused by: {cause}");
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_map_converts_to_ordered_string_map() {
        let mut headers = HeaderMap::new();
        headers.insert("server", "nginx".parse().unwrap());
        headers.insert("content-type", "application/javascript".parse().unwrap());
        let map = headers_to_map(&headers);
        assert_eq!(map["server"], json!("nginx"));
        assert_eq!(map["content-type"], json!("application/javascript"));
    }
}
