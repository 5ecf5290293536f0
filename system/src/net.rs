use get_if_addrs::IfAddr;
use std::io;
use std::net::{IpAddr, Ipv4Addr};

use crate::{Result, SystemError};

/// IPv4 addresses of all local interfaces, loopback included.
pub fn local_ipv4_addrs() -> io::Result<Vec<Ipv4Addr>> {
    let addrs = get_if_addrs::get_if_addrs()?
        .into_iter()
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(v4) => Some(v4.ip),
            IfAddr::V6(_) => None,
        })
        .collect();
    Ok(addrs)
}

/// Address other nodes should use to reach `addr` (`host:port`).
///
/// A loopback host is replaced by the lowest non-loopback IPv4 address of
/// this machine; anything else is returned unchanged.
pub fn advertise_address(addr: &str) -> Result<String> {
    let (host, _) = split_host_port(addr)?;
    if !is_loopback(host) {
        return Ok(addr.to_string());
    }
    let candidates = local_ipv4_addrs()?;
    substitute_loopback(addr, &candidates)
}

fn substitute_loopback(addr: &str, candidates: &[Ipv4Addr]) -> Result<String> {
    let (host, port) = split_host_port(addr)?;
    if !is_loopback(host) {
        return Ok(addr.to_string());
    }

    let mut routable: Vec<Ipv4Addr> = candidates
        .iter()
        .copied()
        .filter(|ip| !ip.is_loopback())
        .collect();
    routable.sort();

    let ip = routable.first().ok_or(SystemError::NoRoutableAddress)?;
    tracing::info!("Advertising {}:{} instead of loopback {}", ip, port, addr);
    Ok(format!("{}:{}", ip, port))
}

fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| SystemError::InvalidAddress(format!("{}: missing port", addr)))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| SystemError::InvalidAddress(format!("{}: {}", addr, e)))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host, port))
}

fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}
