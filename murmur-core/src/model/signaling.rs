use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Offer or answer addressed through the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptionDto {
    pub from_client_id: PeerId,
    pub to_client_id: PeerId,
    pub sdp: String,
}

/// Trickle ICE candidate addressed through the relay. `ice` holds the
/// candidate init object encoded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceDto {
    pub from_client_id: PeerId,
    pub to_client_id: PeerId,
    pub ice: String,
}

/// Relay message contract. The relay forwards these without interpreting
/// the session descriptions or candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "camelCase")]
pub enum SignalMessage {
    JoinRoom(RoomId),
    Welcome {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    IceConfig {
        #[serde(rename = "iceServers")]
        ice_servers: Vec<IceServerConfig>,
    },
    NeedToOffer(Vec<PeerId>),
    Offer(SessionDescriptionDto),
    Answer(SessionDescriptionDto),
    Ice(IceDto),
}
