use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// External tools this run can use, detected once at startup.
///
/// Every tool is optional; a missing tool means its diagnostic category is
/// omitted from the report, never recorded as an error.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    pub node: Option<PathBuf>,
    pub firejail: Option<PathBuf>,
    pub nmap: Option<PathBuf>,
    pub tcptraceroute: Option<PathBuf>,
    pub curl: Option<PathBuf>,
    /// Local `./tlsping` binary, used only when present and executable.
    pub tlsping: Option<PathBuf>,
}

impl Toolbox {
    pub fn detect() -> Self {
        Toolbox {
            node: which::which("node").ok(),
            firejail: which::which("firejail").ok(),
            nmap: which::which("nmap").ok(),
            tcptraceroute: which::which("tcptraceroute").ok(),
            curl: which::which("curl").ok(),
            tlsping: local_executable("./tlsping"),
        }
    }

    pub fn summary(&self) -> String {
        let mut available = Vec::new();
        for (name, path) in [
            ("node", &self.node),
            ("firejail", &self.firejail),
            ("nmap", &self.nmap),
            ("tcptraceroute", &self.tcptraceroute),
            ("curl", &self.curl),
            ("tlsping", &self.tlsping),
        ] {
            if path.is_some() {
                available.push(name);
            }
        }
        available.join(", ")
    }
}

fn local_executable(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    let metadata = path.metadata().ok()?;
    if !metadata.is_file() {
        return None;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return None;
        }
    }
    Some(path.to_path_buf())
}

/// Compose a command, wrapped in firejail when it is available.
///
/// Sandboxing is purely an argv transform over the inner invocation, so the
/// call sites stay free of conditional branching.
pub fn sandboxed(firejail: Option<&PathBuf>, program: &Path, args: Vec<OsString>) -> Command {
    match firejail {
        Some(firejail) => {
            let mut command = Command::new(firejail);
            command
                .arg("--quiet")
                .arg("--private")
                .arg("--net=none")
                .arg(program)
                .args(args);
            command
        }
        None => {
            let mut command = Command::new(program);
            command.args(args);
            command
        }
    }
}
