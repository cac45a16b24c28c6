use duet_core::IceServerConfig;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;

/// Two participants per room: one caller, one callee.
pub const DEFAULT_ROOM_CAPACITY: usize = 2;

#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    /// Consecutive unanswered pings tolerated before the connection is dropped.
    pub miss_allowed: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            miss_allowed: 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    pub room_capacity: usize,
    /// Announced to every client in `welcome`.
    pub ice_servers: Vec<IceServerConfig>,
    pub heartbeat: HeartbeatConfig,
}

impl RelayConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            ..Self::default()
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            room_capacity: DEFAULT_ROOM_CAPACITY,
            ice_servers: IceServerConfig::default_servers(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}
