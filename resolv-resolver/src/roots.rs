//! Compiled-in root hints so a recursive resolve works out of the box.
//! A real deployment may still load a `name IP` text file and override
//! these; that loader lives in the public API layer, not here.

use resolv_net::AgentParams;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

const ROOT_TIMEOUT: Duration = Duration::from_millis(2000);

/// The 13 IANA root server IPv4 addresses, as of this writing. Good enough
/// to bootstrap a delegation walk; not meant to be kept perfectly current.
const ROOTS: &[(&str, Ipv4Addr)] = &[
    ("a.root-servers.net", Ipv4Addr::new(198, 41, 0, 4)),
    ("b.root-servers.net", Ipv4Addr::new(199, 9, 14, 201)),
    ("c.root-servers.net", Ipv4Addr::new(192, 33, 4, 12)),
    ("d.root-servers.net", Ipv4Addr::new(199, 7, 91, 13)),
    ("e.root-servers.net", Ipv4Addr::new(192, 203, 230, 10)),
    ("f.root-servers.net", Ipv4Addr::new(192, 5, 5, 241)),
    ("g.root-servers.net", Ipv4Addr::new(192, 112, 36, 4)),
    ("h.root-servers.net", Ipv4Addr::new(198, 97, 190, 53)),
    ("i.root-servers.net", Ipv4Addr::new(192, 36, 148, 17)),
    ("j.root-servers.net", Ipv4Addr::new(192, 58, 128, 30)),
    ("k.root-servers.net", Ipv4Addr::new(193, 0, 14, 129)),
    ("l.root-servers.net", Ipv4Addr::new(199, 7, 83, 42)),
    ("m.root-servers.net", Ipv4Addr::new(202, 12, 27, 33)),
];

pub fn root_hints() -> Vec<AgentParams> {
    ROOTS
        .iter()
        .enumerate()
        .map(|(priority, (name, addr))| {
            AgentParams::new(
                SocketAddr::from((*addr, 53)),
                ROOT_TIMEOUT,
                priority as u8,
                *name,
            )
        })
        .collect()
}

/// Parses the optional `name IP` root-hints text file format named in the
/// spec's persisted-state section. One entry per line, blank lines and `#`
/// comments ignored.
pub fn parse_hints_file(contents: &str) -> Vec<AgentParams> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .filter_map(|(priority, line)| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let ip: std::net::IpAddr = parts.next()?.parse().ok()?;
            Some(AgentParams::new(
                SocketAddr::from((ip, 53)),
                ROOT_TIMEOUT,
                priority as u8,
                name,
            ))
        })
        .collect()
}
