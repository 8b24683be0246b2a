//! # Ranked Registry Selector
//!
//! Arbitration logic electing the currently-active registry among ranked
//! candidates.
//!
//! ## Overview
//!
//! Each candidate carries an externally supplied rank; exactly one is active
//! at a time: the highest-ranked alive candidate, ties broken by registration
//! order. Arbitration is a pure function recomputed over a snapshot of the
//! alive candidates on every join and leave.
//!
//! Non-active candidates stay fully functional, independent registries.
//! Queries against one candidate never fall through to the active instance,
//! and when the active instance disappears nothing is migrated: data that
//! existed only in the departed instance becomes unreachable through the
//! newly active one.

use crate::registry::namespace_registry::NamespaceRegistry;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// One registry competing for the active role
#[derive(Clone)]
pub struct RegistryCandidate {
    pub registry_id: u64,
    pub rank: i32,
    registration_order: u64,
    pub registry: Arc<NamespaceRegistry>,
}

impl fmt::Debug for RegistryCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCandidate")
            .field("registry_id", &self.registry_id)
            .field("rank", &self.rank)
            .field("registration_order", &self.registration_order)
            .finish()
    }
}

/// Pure arbitration: highest rank wins, ties broken by earliest registration
pub fn arbitrate(candidates: &[RegistryCandidate]) -> Option<&RegistryCandidate> {
    candidates.iter().max_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then(b.registration_order.cmp(&a.registration_order))
    })
}

struct SelectorState {
    candidates: Vec<RegistryCandidate>,
    next_order: u64,
    active_id: Option<u64>,
}

/// Tracks ranked registry candidates and the currently elected active one
pub struct RankedRegistrySelector {
    state: RwLock<SelectorState>,
}

impl RankedRegistrySelector {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SelectorState {
                candidates: Vec::new(),
                next_order: 0,
                active_id: None,
            }),
        }
    }

    /// Register a candidate and re-run arbitration. Registering an id that is
    /// already present is ignored.
    pub fn register(&self, registry_id: u64, rank: i32, registry: Arc<NamespaceRegistry>) -> bool {
        let mut state = self.state.write();
        if state.candidates.iter().any(|c| c.registry_id == registry_id) {
            warn!(registry_id, "Ignoring duplicate registry registration");
            return false;
        }
        let order = state.next_order;
        state.next_order += 1;
        state.candidates.push(RegistryCandidate {
            registry_id,
            rank,
            registration_order: order,
            registry,
        });
        Self::rearbitrate(&mut state);
        true
    }

    /// Remove a candidate and re-run arbitration over the survivors. Entries
    /// that existed only in the departed registry are not migrated.
    pub fn unregister(&self, registry_id: u64) -> bool {
        let mut state = self.state.write();
        let before = state.candidates.len();
        state.candidates.retain(|c| c.registry_id != registry_id);
        if state.candidates.len() == before {
            return false;
        }
        Self::rearbitrate(&mut state);
        true
    }

    /// The currently-active registry, if any candidate is alive
    pub fn active(&self) -> Option<Arc<NamespaceRegistry>> {
        let state = self.state.read();
        let active_id = state.active_id?;
        state
            .candidates
            .iter()
            .find(|c| c.registry_id == active_id)
            .map(|c| c.registry.clone())
    }

    pub fn active_id(&self) -> Option<u64> {
        self.state.read().active_id
    }

    pub fn candidate_count(&self) -> usize {
        self.state.read().candidates.len()
    }

    fn rearbitrate(state: &mut SelectorState) {
        let elected = arbitrate(&state.candidates).map(|c| c.registry_id);
        if elected != state.active_id {
            info!(
                previous = state.active_id,
                elected = elected,
                "Active registry changed"
            );
            state.active_id = elected;
        }
    }
}

impl Default for RankedRegistrySelector {
    fn default() -> Self {
        Self::new()
    }
}
