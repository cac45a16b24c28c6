use duet_core::IceServerConfig;

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub audio: bool,
    pub video: bool,
    /// Offer loopback host candidates as well.
    pub loopback_candidates: bool,
}

impl TransportConfig {
    /// Host candidates only, no STUN. Works on a single machine without network access.
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
            loopback_candidates: true,
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::default_servers(),
            audio: true,
            video: true,
            loopback_candidates: false,
        }
    }
}
