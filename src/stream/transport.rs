//! Transport collaborator interface and the in-memory loopback used by
//! tests and demos.
//!
//! The core never establishes connections or retries sends itself; it only
//! calls `send`/`receive` on whatever implements [`Transport`] and reacts to
//! the inbound [`StreamListener`] callback.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::wrapper::root::Root;

/// Kind tag delivered with inbound transport notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// One or more wrapped logs are queued on the transport.
    Wrapper,
    /// Group membership changed.
    MemberInfo,
}

/// Group-communication primitive the core exchanges wrappers over.
///
/// `send_*` return the transport's success indicator; the core propagates
/// failure to the caller and never retries on its own.
pub trait Transport: Send + Sync {
    fn send_root(&self, root: &Root) -> bool;

    fn send_raw(&self, payload: &str) -> bool;

    /// Drain every wrapper queued since the last call, in arrival order.
    fn receive_all_queued(&self) -> Vec<Root>;

    fn close(&self);
}

/// Inbound notification callback. Implemented by the stream manager and by
/// whatever downstream consumer registers with it.
pub trait StreamListener: Send + Sync {
    fn message_received(&self, kind: MessageKind);
}

/// In-process transport: two endpoints over shared queues. Sends from one
/// endpoint become queued receives on the other.
pub struct InMemoryTransport {
    outbound: Arc<Mutex<VecDeque<Root>>>,
    inbound: Arc<Mutex<VecDeque<Root>>>,
    /// When false, sends report failure without delivering. Lets tests
    /// exercise the transport-failure paths.
    accepting: Arc<Mutex<bool>>,
}

impl InMemoryTransport {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
        let accepting = Arc::new(Mutex::new(true));
        let a = Self {
            outbound: a_to_b.clone(),
            inbound: b_to_a.clone(),
            accepting: accepting.clone(),
        };
        let b = Self {
            outbound: b_to_a,
            inbound: a_to_b,
            accepting,
        };
        (a, b)
    }

    /// Make both endpoints reject sends (or accept them again).
    pub fn set_accepting(&self, accepting: bool) {
        *self.accepting.lock() = accepting;
    }

    /// Number of wrappers waiting on this endpoint.
    pub fn queued(&self) -> usize {
        self.inbound.lock().len()
    }
}

impl Transport for InMemoryTransport {
    fn send_root(&self, root: &Root) -> bool {
        if !*self.accepting.lock() {
            return false;
        }
        self.outbound.lock().push_back(root.clone());
        true
    }

    fn send_raw(&self, payload: &str) -> bool {
        match crate::wrapper::codec::decode(payload) {
            Ok(root) => self.send_root(&root),
            Err(e) => {
                tracing::warn!(error = %e, "raw payload is not a valid wrapper");
                false
            }
        }
    }

    fn receive_all_queued(&self) -> Vec<Root> {
        self.inbound.lock().drain(..).collect()
    }

    fn close(&self) {}
}
