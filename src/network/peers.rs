use log::info;
use std::sync::{PoisonError, RwLock};

/// Known peer endpoints in registration order. The order matters: when two
/// peers offer equally long chains, the one registered first wins.
pub struct PeerRegistry {
    inner: RwLock<Vec<String>>,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerRegistry {
    pub fn new() -> PeerRegistry {
        PeerRegistry {
            inner: RwLock::new(vec![]),
        }
    }

    /// Returns false when `addr` is empty or already known
    pub fn register(&self, addr: &str) -> bool {
        let addr = addr.trim();
        if addr.is_empty() {
            return false;
        }
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.iter().any(|known| known == addr) {
            return false;
        }
        inner.push(addr.to_string());
        info!("Registered peer {addr}");
        true
    }

    pub fn list(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
