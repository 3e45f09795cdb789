use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{Map, Value, json};

/// Scrape asset versions from an instance's index page: the `<base>` href,
/// plus every stylesheet and script whose URL carries a `v` query parameter.
pub async fn fetch_versions(client: &Client, base: &str) -> Option<Map<String, Value>> {
    let response = match client.get(base).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            log::info!("{base}: index returned {}", response.status());
            return None;
        }
        Err(e) => {
            log::info!("{base}: index fetch failed: {e}");
            return None;
        }
    };
    let text = response.text().await.ok()?;
    if text.is_empty() {
        return None;
    }
    let versions = scrape_versions(&text);
    if versions.is_empty() { None } else { Some(versions) }
}

pub fn scrape_versions(html: &str) -> Map<String, Value> {
    let document = Html::parse_document(html);
    let base = Selector::parse("base").unwrap();
    let stylesheets = Selector::parse("link[rel=\"stylesheet\"]").unwrap();
    let scripts = Selector::parse("script").unwrap();

    let mut versions = Map::new();
    for element in document.select(&base) {
        if let Some(href) = element.value().attr("href") {
            versions.insert("base".to_string(), json!(href));
        }
    }
    for element in document.select(&stylesheets) {
        if let Some(href) = element.value().attr("href") {
            if let Some((path, version)) = versioned_asset(href) {
                versions.insert(path, json!(version));
            }
        }
    }
    for element in document.select(&scripts) {
        if let Some(src) = element.value().attr("src") {
            if let Some((path, version)) = versioned_asset(src) {
                versions.insert(path, json!(version));
            }
        }
    }
    versions
}

/// Split an asset reference into its path and the `v` query parameter.
/// References are usually relative (`css/all.css?v=5963`).
fn versioned_asset(reference: &str) -> Option<(String, String)> {
    let (path, tail) = reference.split_once('?')?;
    let query = tail.split('#').next().unwrap_or(tail);
    let version = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key.as_ref() == "v")
        .map(|(_, value)| value.into_owned())?;
    Some((path.to_string(), version))
}

#[cfg(test)]
mod test {
    use super::*;

    const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
  <base href="https://meet.example.org/">
  <link rel="stylesheet" href="css/all.css?v=5963">
  <link rel="stylesheet" href="css/print.css">
  <script src="libs/lib-jitsi-meet.min.js?v=5963"></script>
  <script src="libs/app.bundle.min.js?v=5963&x=1"></script>
  <script>var inline = true;</script>
</head>
<body></body>
</html>"#;

    #[test]
    fn versioned_assets_are_collected_by_path() {
        let versions = scrape_versions(INDEX);
        assert_eq!(versions["base"], json!("https://meet.example.org/"));
        assert_eq!(versions["css/all.css"], json!("5963"));
        assert_eq!(versions["libs/lib-jitsi-meet.min.js"], json!("5963"));
        assert_eq!(versions["libs/app.bundle.min.js"], json!("5963"));
        // unversioned stylesheet and inline script contribute nothing
        assert!(!versions.contains_key("css/print.css"));
        assert_eq!(versions.len(), 4);
    }

    #[test]
    fn page_without_versioned_assets_yields_empty_map() {
        assert!(scrape_versions("<html><body><p>hi</p></body></html>").is_empty());
    }
}
