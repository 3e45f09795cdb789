use std::net::IpAddr;

use tokio::process::Command;

use crate::diagnostics::tools::Toolbox;
use crate::report::record::Hop;

/// Trace the TCP path to the host's port 443 and parse the hop table.
pub async fn tcptraceroute(tools: &Toolbox, host: &str) -> Option<Vec<Hop>> {
    let tcptraceroute = tools.tcptraceroute.as_ref()?;
    let output = match Command::new(tcptraceroute)
        .args([host, "443"])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{host}: tcptraceroute invocation failed: {e}");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    Some(parse_hops(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse tcptraceroute's line-oriented output.
///
/// Only lines starting with an integer hop index count. The second token is
/// a `*` marker, a bare IP, or a hostname optionally followed by its address
/// in parentheses. Lines with more than 4 tokens carry round-trip times;
/// every trailing token that parses as a float is one, in milliseconds.
pub fn parse_hops(stdout: &str) -> Vec<Hop> {
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 || parts[0].parse::<u32>().is_err() {
            continue;
        }

        let mut hop = Hop {
            hostname: None,
            ip: None,
            times_in_ms: None,
        };
        if parts[1] == "*" {
            hop.hostname = Some("*".to_string());
        } else if let Ok(ip) = parts[1].parse::<IpAddr>() {
            hop.ip = Some(ip.to_string());
        } else {
            hop.hostname = Some(parts[1].to_string());
            if let Some(address) = parts.get(2) {
                let trimmed = address.trim_start_matches('(').trim_end_matches(')');
                match trimmed.parse::<IpAddr>() {
                    Ok(ip) => hop.ip = Some(ip.to_string()),
                    Err(e) => log::info!("hop address `{trimmed}` is not an IP: {e}"),
                }
            }
        }

        if parts.len() > 4 {
            let times: Vec<f64> = parts[2..]
                .iter()
                .filter_map(|token| token.parse::<f64>().ok())
                .collect();
            hop.times_in_ms = Some(times);
        }
        entries.push(hop);
    }
    entries
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "\
Selected device eth0, address 192.0.2.5, port 39651 for outgoing packets
Tracing the path to meet.example.org (203.0.113.10) on TCP port 443, 30 hops max
 1  192.0.2.1  0.317 ms  0.278 ms  0.253 ms
 2  *
 3  gw.example.net (198.51.100.7)  9.823 ms  9.911 ms  10.046 ms
 4  203.0.113.10 [open]  20.112 ms  19.877 ms  20.005 ms
";

    #[test]
    fn hops_parse_into_marker_ip_and_hostname_entries() {
        let hops = parse_hops(SAMPLE);
        assert_eq!(hops.len(), 4);

        assert_eq!(hops[0].ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(hops[0].hostname, None);
        assert_eq!(
            hops[0].times_in_ms.as_deref(),
            Some(&[0.317, 0.278, 0.253][..])
        );

        assert_eq!(hops[1].hostname.as_deref(), Some("*"));
        assert_eq!(hops[1].ip, None);
        assert_eq!(hops[1].times_in_ms, None);

        assert_eq!(hops[2].hostname.as_deref(), Some("gw.example.net"));
        assert_eq!(hops[2].ip.as_deref(), Some("198.51.100.7"));
        assert_eq!(
            hops[2].times_in_ms.as_deref(),
            Some(&[9.823, 9.911, 10.046][..])
        );
    }

    #[test]
    fn non_hop_lines_are_ignored() {
        let hops = parse_hops("no hops here\nTracing the path to example.org\n");
        assert!(hops.is_empty());
    }

    #[test]
    fn non_numeric_trailing_tokens_are_skipped() {
        let hops = parse_hops(" 4  203.0.113.10 [open]  20.112 ms  19.877 ms\n");
        assert_eq!(hops[0].ip.as_deref(), Some("203.0.113.10"));
        assert_eq!(
            hops[0].times_in_ms.as_deref(),
            Some(&[20.112, 19.877][..])
        );
    }
}
