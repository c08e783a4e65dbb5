use murmur_core::PeerId;
use murmur_core::utils::{MAX_BUFFERED_CANDIDATES, MAX_ORPHAN_PEERS};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Candidates from identities the registry has no entry for yet.
///
/// Bounded both ways: each identity keeps its newest candidates, and when
/// too many identities are waiting the one that started waiting first is
/// forgotten.
#[derive(Debug)]
pub struct CandidateBuffer {
    candidates: HashMap<PeerId, VecDeque<String>>,
    arrival: VecDeque<PeerId>,
    max_peers: usize,
    max_per_peer: usize,
}

impl CandidateBuffer {
    pub fn new(max_peers: usize, max_per_peer: usize) -> Self {
        Self {
            candidates: HashMap::new(),
            arrival: VecDeque::new(),
            max_peers: max_peers.max(1),
            max_per_peer: max_per_peer.max(1),
        }
    }

    pub fn push(&mut self, peer_id: PeerId, candidate: String) {
        if !self.candidates.contains_key(&peer_id) {
            while self.arrival.len() >= self.max_peers {
                let Some(oldest) = self.arrival.pop_front() else {
                    break;
                };
                debug!("Forgetting buffered candidates from {}", oldest);
                self.candidates.remove(&oldest);
            }
            self.arrival.push_back(peer_id.clone());
        }

        let queue = self.candidates.entry(peer_id).or_default();
        if queue.len() == self.max_per_peer {
            queue.pop_front();
        }
        queue.push_back(candidate);
    }

    /// Removes and returns everything held for `peer_id`, oldest first.
    pub fn take(&mut self, peer_id: &PeerId) -> Vec<String> {
        self.arrival.retain(|id| id != peer_id);
        self.candidates
            .remove(peer_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.arrival.clear();
    }

    /// Number of identities with candidates waiting.
    pub fn peer_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.values().map(VecDeque::len).sum()
    }
}

impl Default for CandidateBuffer {
    fn default() -> Self {
        Self::new(MAX_ORPHAN_PEERS, MAX_BUFFERED_CANDIDATES)
    }
}
