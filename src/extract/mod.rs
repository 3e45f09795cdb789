//! Turns loosely-formatted JavaScript configuration source into structured
//! data.
//!
//! Two stages, each only attempted when the previous produced nothing:
//! evaluation under a real JavaScript runtime, then a heuristic text rewrite
//! followed by a YAML-compatible parse. The second stage never hard-fails:
//! an unparseable script yields a `{"ParseError": ...}` mapping so the
//! report stays inspectable.

pub mod node;
pub mod rewrite;

use serde_json::{Value, json};

use crate::diagnostics::tools::Toolbox;

/// Derive the expected top-level variable from the script file name:
/// snake_case stem to camelCase (`logging_config.js` -> `loggingConfig`,
/// `config.js` -> `config`).
pub fn var_name_from_file_name(name: &str) -> String {
    let stem = name.strip_suffix(".js").unwrap_or(name);
    if !stem.contains('_') {
        return stem.to_string();
    }
    let mut segments = stem.split('_');
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) => {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
            None => out.push('_'),
        }
    }
    out
}

/// Extract the configuration value from fetched script source.
///
/// Returns `None` when nothing usable could be obtained, which the caller
/// treats as "no config", not as an error.
pub async fn extract(tools: &Toolbox, name: &str, source: &str) -> Option<Value> {
    if let Some(value) = node::eval_with_node(tools, name, source).await {
        return Some(value);
    }
    log::info!("{name}: falling back to text rewriting");
    let cleaned = rewrite::rewrite(source);
    match serde_yaml::from_str::<Value>(&cleaned) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => Some(json!({ "ParseError": e.to_string() })),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn var_names_are_camel_cased_from_snake_case() {
        assert_eq!(var_name_from_file_name("config.js"), "config");
        assert_eq!(var_name_from_file_name("logging_config.js"), "loggingConfig");
        assert_eq!(var_name_from_file_name("interface_config.js"), "interfaceConfig");
    }

    fn fallback_extract(source: &str) -> Option<Value> {
        // no node in the toolbox, so only the rewrite stage runs
        let tools = Toolbox::default();
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(extract(&tools, "config.js", source))
    }

    #[test]
    fn object_literal_with_trailing_comment_parses_without_a_runtime() {
        let body = "var config = {\n  hosts: {\n    domain: 'meet.example.org' //comment\n  },\n};";
        assert_eq!(
            fallback_extract(body),
            Some(json!({"hosts": {"domain": "meet.example.org"}}))
        );
    }

    #[test]
    fn clean_json_literal_parses_unchanged() {
        let body = "{\"p2p\": {\"enabled\": true}, \"resolution\": 720}";
        assert_eq!(
            fallback_extract(body),
            Some(json!({"p2p": {"enabled": true}, "resolution": 720}))
        );
    }

    #[test]
    fn mixed_comment_styles_and_tabs_parse_like_plain_json() {
        let body = concat!(
            "/* header */\n",
            "var config = {\n",
            "\thosts: {\n",
            "\t\tdomain: 'meet.example.org', // main\n",
            "\t\tmuc: 'conference.meet.example.org'\n",
            "\t},\n",
            "\tenableWelcomePage: true\n",
            "};\n",
            "config.extra = 1;\n",
        );
        assert_eq!(
            fallback_extract(body),
            Some(json!({
                "hosts": {
                    "domain": "meet.example.org",
                    "muc": "conference.meet.example.org"
                },
                "enableWelcomePage": true
            }))
        );
    }

    #[test]
    fn unparseable_source_yields_error_mapping_not_failure() {
        let value = fallback_extract("var config = {{{{ not even close").unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("ParseError"));
        assert!(object["ParseError"].is_string());
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert_eq!(fallback_extract(""), None);
    }
}
