use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tokio::process::Command;

use crate::diagnostics::tools::Toolbox;

static ACCEPT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|").unwrap());
static KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[_ ]( *)(.*:)").unwrap());
static BARE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\| ( *)([^:]+)$").unwrap());

/// Enumerate the host's TLS ciphers with `nmap --script ssl-enum-ciphers`.
///
/// On success the tree-drawing output is converted to YAML and the
/// `ssl-enum-ciphers` subsection returned; a non-zero exit yields the tool's
/// stderr wrapped in `<pre>` for the HTML report.
pub async fn ssl_enum_ciphers(tools: &Toolbox, host: &str) -> Option<Value> {
    let nmap = tools.nmap.as_ref()?;
    let output = match Command::new(nmap)
        .args(["--script", "ssl-enum-ciphers", "-p", "443", host])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{host}: nmap invocation failed: {e}");
            return None;
        }
    };

    if !output.status.success() {
        return Some(Value::String(format!(
            "<pre>{}</pre>",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = tree_to_yaml(&stdout);
    if text.is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Value>(&text) {
        Ok(document) => document.get("ssl-enum-ciphers").cloned(),
        Err(e) => {
            log::warn!("{host}: converted nmap output is not YAML: {e}\n{text}");
            None
        }
    }
}

/// Convert nmap's script output tree into a YAML document.
///
/// Keeps only `|`-prefixed lines; `|_` (last item) collapses to the same
/// indentation as a key line, and a bare indented value becomes a quoted
/// sequence item.
pub fn tree_to_yaml(stdout: &str) -> String {
    let mut text = String::new();
    for line in stdout.split('\n') {
        if !ACCEPT.is_match(line) {
            continue;
        }
        let line = KEY_LINE.replace(line, "${1}${2}");
        let line = BARE_VALUE.replace(&line, "${1}- \"${2}\"");
        text.push_str(&line);
        text.push('\n');
    }
    text
}
