/*! Configuration structures for the server and client binaries.
Plain data, `serde`-derived so each binary's `--dump-config` flag can
write out the resolved settings (built from its `clap` `Opt`) as a JSON
sidecar alongside the CLI flags it also accepts.
*/

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default flow-control window, in frames, granted to a client session.
pub const DEFAULT_MAX_CREDIT: usize = 5;

/// Simulator server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on. A server binding `[::]:PORT` falls back to
    /// `0.0.0.0:PORT` if the OS has no IPv6 stack.
    pub listen_addr: SocketAddr,
}

impl ServerConfig {
    /// Bind address defaulting to the dual-stack-friendly `[::]:port`.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::new(std::net::Ipv6Addr::UNSPECIFIED.into(), port),
        }
    }
}

/// Client configuration: where to connect, what map to seed the
/// session with, and how to pace playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Path to an image used to build the initial map.
    pub map: PathBuf,
    /// Image pixels per cell, in both dimensions.
    pub cell_size: u32,
    /// Generations the server computes per emitted frame.
    pub sampling: u32,
    /// Milliseconds between paced frame deliveries. `None` means
    /// free-run (deliver every frame as soon as it's decoded).
    pub update_interval_ms: Option<u64>,
    /// Flow-control window size, in frames.
    pub max_credit: usize,
}

impl ClientConfig {
    /// A config with the protocol's documented default `max_credit` and
    /// a 1-generation-per-frame sampling factor.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, map: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            map: map.into(),
            cell_size: 1,
            sampling: 1,
            update_interval_ms: None,
            max_credit: DEFAULT_MAX_CREDIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults_to_dual_stack_unspecified() {
        let cfg = ServerConfig::with_port(9000);
        assert_eq!(cfg.listen_addr.port(), 9000);
        assert!(cfg.listen_addr.ip().is_unspecified());
    }

    #[test]
    fn client_config_new_has_protocol_default_credit() {
        let cfg = ClientConfig::new("localhost", 9000, "map.png");
        assert_eq!(cfg.max_credit, DEFAULT_MAX_CREDIT);
        assert_eq!(cfg.update_interval_ms, None);
    }

    #[test]
    fn client_config_roundtrips_through_json() {
        let cfg = ClientConfig::new("example.org", 1234, "map.png");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_credit, cfg.max_credit);
    }
}
