use std::ffi::OsString;
use std::process::Stdio;

use serde_json::Value;
use tokio::fs;

use crate::diagnostics::tools::{Toolbox, sandboxed};
use crate::extract::var_name_from_file_name;

/// Evaluate a fetched config script under Node and capture the named
/// top-level variable as JSON.
///
/// The source is written to a scratch file in a fresh temp directory with a
/// `console.log(JSON.stringify(<var>))` statement appended, then executed —
/// inside firejail when available. Every failure is logged and yields `None`
/// so the caller can fall through to the text-rewriting stage.
pub async fn eval_with_node(tools: &Toolbox, name: &str, source: &str) -> Option<Value> {
    let node = tools.node.as_ref()?;
    let var_name = var_name_from_file_name(name);

    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("{name}: no scratch directory: {e}");
            return None;
        }
    };
    let js_path = scratch.path().join(name);
    let mut script = String::with_capacity(source.len() + 64);
    script.push_str(source);
    script.push_str(&format!(";\nconsole.log(JSON.stringify({var_name}));\n"));
    if let Err(e) = fs::write(&js_path, script).await {
        log::warn!("{name}: writing scratch file failed: {e}");
        return None;
    }

    let mut command = sandboxed(
        tools.firejail.as_ref(),
        node,
        vec![OsString::from(&js_path)],
    );
    command.stdout(Stdio::piped()).stderr(Stdio::null());
    let output = match command.output().await {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{name}: node invocation failed: {e}");
            return None;
        }
    };

    match serde_json::from_slice(&output.stdout) {
        Ok(value) => Some(value),
        Err(e) => {
            log::info!("{name}: node output is not JSON: {e}");
            None
        }
    }
}
