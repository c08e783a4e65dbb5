use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use murmur_core::{IceDto, PeerId, RoomId, SessionDescriptionDto, SignalMessage};
use murmur_mesh::{RegistryCommand, SignalingOutput};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A message that went through the relay, for verification.
#[derive(Debug, Clone, PartialEq)]
pub enum Relayed {
    Offer { from: PeerId, to: PeerId },
    Answer { from: PeerId, to: PeerId },
    Ice { from: PeerId, to: PeerId, candidate: String },
}

struct Member {
    room: Option<RoomId>,
    tx: mpsc::Sender<RegistryCommand>,
}

#[derive(Default)]
struct RelayState {
    members: BTreeMap<PeerId, Member>,
    log: Vec<Relayed>,
}

/// In-process relay hub with the real relay's routing rules: a joiner is
/// told who is already in the room, everything else is forwarded by
/// recipient id.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    inner: Arc<Mutex<RelayState>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a client. It is welcomed with `id` right away.
    pub fn attach(&self, id: &PeerId, tx: mpsc::Sender<RegistryCommand>) -> RelayPort {
        let _ = tx.try_send(RegistryCommand::Signal(SignalMessage::Welcome {
            peer_id: id.clone(),
        }));
        self.inner
            .lock()
            .members
            .insert(id.clone(), Member { room: None, tx });

        RelayPort {
            id: id.clone(),
            relay: self.clone(),
        }
    }

    /// Delivers `msg` to `to` as if the relay sent it.
    pub fn deliver(&self, to: &PeerId, msg: SignalMessage) {
        let inner = self.inner.lock();
        match inner.members.get(to) {
            Some(member) => {
                let _ = member.tx.try_send(RegistryCommand::Signal(msg));
            }
            None => tracing::debug!("[MemoryRelay] no member {}, dropping", to),
        }
    }

    pub fn log(&self) -> Vec<Relayed> {
        self.inner.lock().log.clone()
    }

    pub fn offers(&self) -> Vec<(PeerId, PeerId)> {
        self.log()
            .into_iter()
            .filter_map(|m| match m {
                Relayed::Offer { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(PeerId, PeerId)> {
        self.log()
            .into_iter()
            .filter_map(|m| match m {
                Relayed::Answer { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn candidates_to(&self, to: &PeerId) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|m| match m {
                Relayed::Ice { to: t, candidate, .. } if &t == to => Some(candidate),
                _ => None,
            })
            .collect()
    }

    fn record(&self, entry: Relayed) {
        self.inner.lock().log.push(entry);
    }
}

/// One client's connection to the `MemoryRelay`.
pub struct RelayPort {
    id: PeerId,
    relay: MemoryRelay,
}

#[async_trait]
impl SignalingOutput for RelayPort {
    async fn join(&self, room: RoomId) {
        let existing: Vec<PeerId> = {
            let mut inner = self.relay.inner.lock();
            let existing = inner
                .members
                .iter()
                .filter(|(id, m)| **id != self.id && m.room.as_ref() == Some(&room))
                .map(|(id, _)| id.clone())
                .collect();
            if let Some(me) = inner.members.get_mut(&self.id) {
                me.room = Some(room);
            }
            existing
        };

        self.relay
            .deliver(&self.id, SignalMessage::NeedToOffer(existing));
    }

    async fn send_offer(&self, peer_id: PeerId, sdp: String) {
        self.relay.record(Relayed::Offer {
            from: self.id.clone(),
            to: peer_id.clone(),
        });
        self.relay.deliver(
            &peer_id,
            SignalMessage::Offer(SessionDescriptionDto {
                from_client_id: self.id.clone(),
                to_client_id: peer_id.clone(),
                sdp,
            }),
        );
    }

    async fn send_answer(&self, peer_id: PeerId, sdp: String) {
        self.relay.record(Relayed::Answer {
            from: self.id.clone(),
            to: peer_id.clone(),
        });
        self.relay.deliver(
            &peer_id,
            SignalMessage::Answer(SessionDescriptionDto {
                from_client_id: self.id.clone(),
                to_client_id: peer_id.clone(),
                sdp,
            }),
        );
    }

    async fn send_ice(&self, peer_id: PeerId, candidate: String) {
        self.relay.record(Relayed::Ice {
            from: self.id.clone(),
            to: peer_id.clone(),
            candidate: candidate.clone(),
        });
        self.relay.deliver(
            &peer_id,
            SignalMessage::Ice(IceDto {
                from_client_id: self.id.clone(),
                to_client_id: peer_id.clone(),
                ice: candidate,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_joiner_learns_existing_members() {
        let relay = MemoryRelay::new();
        let (a_tx, mut a_rx) = mpsc::channel(16);
        let (b_tx, mut b_rx) = mpsc::channel(16);

        let a = relay.attach(&PeerId::from("a"), a_tx);
        let b = relay.attach(&PeerId::from("b"), b_tx);

        a.join(RoomId::from("r")).await;
        b.join(RoomId::from("r")).await;

        // welcome, then the membership list
        let _ = a_rx.recv().await;
        let _ = b_rx.recv().await;
        assert!(matches!(
            a_rx.recv().await,
            Some(RegistryCommand::Signal(SignalMessage::NeedToOffer(ids))) if ids.is_empty()
        ));
        assert!(matches!(
            b_rx.recv().await,
            Some(RegistryCommand::Signal(SignalMessage::NeedToOffer(ids))) if ids == vec![PeerId::from("a")]
        ));
    }
}
