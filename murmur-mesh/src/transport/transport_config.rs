use murmur_core::IceServerConfig;
use murmur_core::utils::DEFAULT_STUN_ADDR;

/// ICE configuration applied to every new peer connection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}
