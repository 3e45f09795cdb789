use serde_json::Value;
use tokio::process::Command;

use crate::diagnostics::tools::Toolbox;

/// Run the local `./tlsping` binary against `<host>:443`.
///
/// Exit 0 yields the tool's parsed JSON; a non-zero exit yields its raw
/// stderr text. A missing binary yields nothing at all.
pub async fn tlsping(tools: &Toolbox, host: &str) -> Option<Value> {
    let tlsping = tools.tlsping.as_ref()?;
    let output = match Command::new(tlsping)
        .arg("-json")
        .arg(format!("{host}:443"))
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{host}: tlsping invocation failed: {e}");
            return None;
        }
    };

    if output.status.success() {
        match serde_json::from_slice(&output.stdout) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{host}: tlsping output is not JSON: {e}");
                Some(Value::String(
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                ))
            }
        }
    } else {
        Some(Value::String(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}
