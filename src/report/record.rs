use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything learned about one instance during one run.
///
/// Field names mirror the published report schema, so most carry a serde
/// rename. Upstream data is uncontrolled, which is why the config blobs stay
/// `serde_json::Value` rather than a typed schema. `notes` is the open bucket
/// for error-kind entries (`certificateError`, `fetchedViaFallback`, ...)
/// that don't belong to a fixed category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeRecord {
    /// Always present once the instance responded with any content.
    #[serde(rename = "config.js", default = "empty_object")]
    pub config: Value,

    #[serde(
        rename = "logging_config.js",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub logging_config: Option<Value>,

    #[serde(rename = "httpHeaders", default, skip_serializing_if = "Option::is_none")]
    pub http_headers: Option<Map<String, Value>>,

    /// Peer address of the connection that served config.js.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Asset versions scraped from the instance's index page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Map<String, Value>>,

    /// Unix timestamp when this instance's probe started, whole seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<i64>,

    /// Wall-clock seconds spent on the sequential probe phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Negotiated TLS protocol version, or the handshake error verbatim.
    #[serde(rename = "TLS", default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlsping: Option<Value>,

    #[serde(
        rename = "ssl-enum-ciphers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ssl_enum_ciphers: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcptraceroute: Option<Vec<Hop>>,

    #[serde(flatten)]
    pub notes: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for ProbeRecord {
    fn default() -> Self {
        ProbeRecord {
            config: empty_object(),
            logging_config: None,
            http_headers: None,
            ip: None,
            versions: None,
            starttime: None,
            duration: None,
            tls: None,
            tlsping: None,
            ssl_enum_ciphers: None,
            tcptraceroute: None,
            notes: Map::new(),
        }
    }
}

/// One hop of a tcptraceroute run.
///
/// A hop that never answered has `hostname == Some("*")`; a hop that
/// resolved has an `ip`, and keeps the printed hostname too when the tool
/// showed both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(rename = "timesInMs", default, skip_serializing_if = "Option::is_none")]
    pub times_in_ms: Option<Vec<f64>>,
}

impl Hop {
    pub fn unanswered() -> Self {
        Hop {
            hostname: Some("*".to_string()),
            ip: None,
            times_in_ms: None,
        }
    }
}
