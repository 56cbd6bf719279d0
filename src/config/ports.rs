// ABOUTME: Parsing of port and volume strings from the container section.
// ABOUTME: "[ip:][host:]container[/proto]" ports and "source:target[:ro]" volumes.

use crate::error::{Error, Result};
use crate::runtime::{PortMapping, Protocol, VolumeMount};

/// Parse a port mapping like "80", "8080:80", "127.0.0.1:8080:80/udp".
pub fn parse_port_mapping(spec: &str) -> Result<PortMapping> {
    let invalid = || Error::InvalidConfig(format!("invalid port mapping: {}", spec));

    let (port_part, protocol) = match spec.split_once('/') {
        Some((ports, "tcp")) => (ports, Protocol::Tcp),
        Some((ports, "udp")) => (ports, Protocol::Udp),
        Some(_) => return Err(invalid()),
        None => (spec, Protocol::Tcp),
    };

    let parts: Vec<&str> = port_part.split(':').collect();
    let port = |s: &str| s.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(invalid);

    match parts.as_slice() {
        [container] => Ok(PortMapping {
            host_port: None,
            container_port: port(container)?,
            protocol,
            host_ip: None,
        }),
        [host, container] => Ok(PortMapping {
            host_port: Some(port(host)?),
            container_port: port(container)?,
            protocol,
            host_ip: None,
        }),
        [ip, host, container] => Ok(PortMapping {
            host_port: if host.is_empty() {
                None
            } else {
                Some(port(host)?)
            },
            container_port: port(container)?,
            protocol,
            host_ip: Some(ip.to_string()),
        }),
        _ => Err(invalid()),
    }
}

/// Parse a volume mount like "source:target" or "source:target:ro".
pub fn parse_volume_mount(spec: &str) -> Result<VolumeMount> {
    let invalid = || Error::InvalidConfig(format!("invalid volume mount: {}", spec));

    let parts: Vec<&str> = spec.split(':').collect();
    let (source, target, read_only) = match parts.as_slice() {
        [source, target] => (*source, *target, false),
        [source, target, "ro"] => (*source, *target, true),
        [source, target, "rw"] => (*source, *target, false),
        _ => return Err(invalid()),
    };

    if source.is_empty() || !target.starts_with('/') {
        return Err(invalid());
    }

    Ok(VolumeMount {
        source: source.to_string(),
        target: target.to_string(),
        read_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_port_only_publishes_ephemeral() {
        let port = parse_port_mapping("80").unwrap();
        assert_eq!(port.host_port, None);
        assert_eq!(port.container_port, 80);
        assert_eq!(port.protocol, Protocol::Tcp);
    }

    #[test]
    fn host_ip_and_protocol() {
        let port = parse_port_mapping("127.0.0.1:5353:53/udp").unwrap();
        assert_eq!(port.host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(port.host_port, Some(5353));
        assert_eq!(port.container_port, 53);
        assert_eq!(port.protocol, Protocol::Udp);
    }

    #[test]
    fn rejects_garbage_ports() {
        assert!(parse_port_mapping("http").is_err());
        assert!(parse_port_mapping("8080:80/sctp").is_err());
        assert!(parse_port_mapping("0:80").is_err());
        assert!(parse_port_mapping("1:2:3:4").is_err());
    }

    #[test]
    fn volumes_parse_read_only_flag() {
        let vol = parse_volume_mount("/srv/data:/data:ro").unwrap();
        assert!(vol.read_only);
        let vol = parse_volume_mount("cache:/cache").unwrap();
        assert!(!vol.read_only);
        assert_eq!(vol.source, "cache");
    }

    #[test]
    fn rejects_relative_volume_target() {
        assert!(parse_volume_mount("/srv:data").is_err());
        assert!(parse_volume_mount("/srv").is_err());
    }
}
