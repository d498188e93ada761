//! Session-scoped orchestrator for log exchange.
//!
//! A [`LogStreamManager`] owns the authoritative local mirror (known
//! structures, the ordered operation log, and optional source fragments),
//! moves wrappers over an injected [`Transport`], and replays operations
//! against the mirror. The mirror is touched by two actors (the local
//! producer and the transport's delivery callback), so every mirror access
//! happens under one mutex: multi-step calls like `unwrap` must not
//! interleave with a concurrent clear or another `unwrap`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Settings;
use crate::error::LogError;
use crate::model::DataStructure;
use crate::stream::logfile;
use crate::stream::transport::{MessageKind, StreamListener, Transport};
use crate::wrapper::codec::{self, EncodeMode};
use crate::wrapper::operation::Operation;
use crate::wrapper::root::{AnnotatedVariable, Header, Root};

/// The local reconstruction of structures, operations, and sources.
#[derive(Debug, Default)]
struct Mirror {
    structures: BTreeMap<String, DataStructure>,
    operations: Vec<Operation>,
    sources: Option<BTreeMap<String, Vec<String>>>,
}

impl Mirror {
    /// Merge a wrapper's contents into the mirror.
    ///
    /// The header pass is all-or-nothing: every declaration is parsed before
    /// any is inserted, so a bad declaration leaves the mirror untouched.
    /// The body pass stops at the first bad operation; operations converted
    /// before it remain appended.
    fn unwrap_root(&mut self, root: Root) -> Result<(), LogError> {
        if let Some(header) = root.header {
            let mut parsed = Vec::with_capacity(header.annotated_variables.len());
            for av in header.annotated_variables.values() {
                parsed.push(DataStructure::from_declaration(av)?);
            }
            for ds in parsed {
                // Redeclaring an identifier replaces the old instance,
                // element state and pending counters included.
                if self.structures.contains_key(ds.identifier()) {
                    tracing::debug!(identifier = %ds.identifier(), "structure redeclared");
                }
                self.structures.insert(ds.identifier().to_string(), ds);
            }
            self.sources = header.sources;
        }
        if let Some(body) = root.body {
            for raw in &body {
                let op = Operation::from_raw(raw)?;
                for locator in op.locators() {
                    if !self.structures.contains_key(&locator.identifier) {
                        return Err(LogError::UnknownStructure(locator.identifier.clone()));
                    }
                }
                self.operations.push(op);
            }
        }
        Ok(())
    }

    /// Snapshot the mirror into a wrapper. Does not mutate.
    fn wrap(&self) -> Root {
        let vars: BTreeMap<String, AnnotatedVariable> = self
            .structures
            .values()
            .map(|ds| (ds.identifier().to_string(), ds.declaration()))
            .collect();
        let body = self.operations.iter().map(Operation::to_raw).collect();
        Root::new(Some(Header::new(vars, self.sources.clone())), Some(body))
    }

    /// Replay one operation against every structure it names.
    fn apply(&mut self, op: &Operation) -> Result<(), LogError> {
        for locator in op.locators() {
            if !self.structures.contains_key(&locator.identifier) {
                return Err(LogError::UnknownStructure(locator.identifier.clone()));
            }
        }
        // A swap may name the same structure twice; apply once per structure,
        // the structure matches its own sides internally.
        let mut seen = BTreeSet::new();
        for locator in op.locators() {
            if seen.insert(locator.identifier.clone()) {
                if let Some(ds) = self.structures.get_mut(&locator.identifier) {
                    ds.apply(op);
                }
            }
        }
        Ok(())
    }

    fn clear_all(&mut self) {
        self.structures.clear();
        self.operations.clear();
        self.sources = None;
    }
}

/// Handles log exchange between processes, components, and the file system.
pub struct LogStreamManager<T: Transport> {
    settings: Settings,
    transport: T,
    mirror: Mutex<Mirror>,
    listener: Mutex<Option<Box<dyn StreamListener>>>,
}

impl<T: Transport> LogStreamManager<T> {
    /// Create a manager over the given transport. Inbound messages are
    /// ignored until a listener is registered.
    pub fn new(settings: Settings, transport: T) -> Self {
        tracing::debug!(agent = %settings.agent, "starting log stream manager");
        Self {
            settings,
            transport,
            mirror: Mutex::new(Mirror::default()),
            listener: Mutex::new(None),
        }
    }

    /// Register the listener notified after inbound wrappers are unwrapped.
    pub fn set_listener(&self, listener: Box<dyn StreamListener>) {
        *self.listener.lock() = Some(listener);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Mirror access
    // ------------------------------------------------------------------

    /// Register a locally produced structure, replacing any previous one
    /// under the same identifier.
    pub fn register_structure(&self, ds: DataStructure) {
        let mut mirror = self.mirror.lock();
        mirror.structures.insert(ds.identifier().to_string(), ds);
    }

    /// Append a locally produced operation to the session log.
    pub fn append_operation(&self, op: Operation) {
        self.mirror.lock().operations.push(op);
    }

    /// Attach source-code fragments for declared structures.
    pub fn set_sources(&self, sources: Option<BTreeMap<String, Vec<String>>>) {
        self.mirror.lock().sources = sources;
    }

    /// Clone of the named structure's current state.
    pub fn structure(&self, identifier: &str) -> Option<DataStructure> {
        self.mirror.lock().structures.get(identifier).cloned()
    }

    /// Clone of the accumulated operation log.
    pub fn operations(&self) -> Vec<Operation> {
        self.mirror.lock().operations.clone()
    }

    pub fn operation_count(&self) -> usize {
        self.mirror.lock().operations.len()
    }

    pub fn structure_count(&self) -> usize {
        self.mirror.lock().structures.len()
    }

    /// Replay one operation against the mirror, updating element values,
    /// counters, and dirty sets. Fails without touching anything when a
    /// locator names an unknown structure.
    pub fn apply(&self, op: &Operation) -> Result<(), LogError> {
        self.mirror.lock().apply(op)
    }

    /// Replay a batch in order, stopping at the first failure.
    pub fn apply_all(&self, ops: &[Operation]) -> Result<(), LogError> {
        let mut mirror = self.mirror.lock();
        for op in ops {
            mirror.apply(op)?;
        }
        Ok(())
    }

    /// Merge a received wrapper into the mirror. See [`Mirror::unwrap_root`]
    /// for the partial-failure rules.
    pub fn unwrap(&self, root: Root) -> Result<(), LogError> {
        self.mirror.lock().unwrap_root(root)
    }

    /// Decode a JSON string, then unwrap it.
    pub fn unwrap_json(&self, json: &str) -> Result<(), LogError> {
        self.unwrap(codec::decode(json)?)
    }

    /// Snapshot the mirror into a wrapper without mutating manager state.
    pub fn wrap(&self) -> Root {
        self.mirror.lock().wrap()
    }

    pub fn clear_all(&self) {
        self.mirror.lock().clear_all();
    }

    pub fn clear_operations(&self) {
        self.mirror.lock().operations.clear();
    }

    pub fn clear_structures(&self) {
        self.mirror.lock().structures.clear();
    }

    // ------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------

    /// Wrap the current mirror and send it.
    pub fn stream_log_data(&self) -> Result<(), LogError> {
        let root = self.wrap();
        self.stream_root(&root)
    }

    /// Wrap, send, and clear the mirror. The mirror is cleared only on
    /// confirmed send success; on failure it is untouched and the caller
    /// may retry.
    pub fn stream_and_clear_log_data(&self) -> Result<(), LogError> {
        let mut mirror = self.mirror.lock();
        let root = mirror.wrap();
        if !self.transport.send_root(&root) {
            return Err(LogError::Transport);
        }
        mirror.clear_all();
        Ok(())
    }

    /// Send one wrapper.
    pub fn stream_root(&self, root: &Root) -> Result<(), LogError> {
        if self.transport.send_root(root) {
            Ok(())
        } else {
            Err(LogError::Transport)
        }
    }

    /// Send several wrappers; fails if ANY send failed, after attempting
    /// all of them.
    pub fn stream_roots(&self, roots: &[Root]) -> Result<(), LogError> {
        let mut all_sent = true;
        for root in roots {
            all_sent &= self.transport.send_root(root);
        }
        if all_sent {
            Ok(())
        } else {
            Err(LogError::Transport)
        }
    }

    /// Send a single operation in a header-less wrapper.
    pub fn stream_operation(&self, op: &Operation) -> Result<(), LogError> {
        self.stream_root(&Root::new(None, Some(vec![op.to_raw()])))
    }

    /// Send a batch of operations in a header-less wrapper.
    pub fn stream_operations(&self, ops: &[Operation]) -> Result<(), LogError> {
        let body = ops.iter().map(Operation::to_raw).collect();
        self.stream_root(&Root::new(None, Some(body)))
    }

    /// Send a body-less wrapper declaring one structure.
    pub fn stream_structure(&self, ds: &DataStructure) -> Result<(), LogError> {
        let mut vars = BTreeMap::new();
        vars.insert(ds.identifier().to_string(), ds.declaration());
        self.stream_root(&Root::new(Some(Header::new(vars, None)), None))
    }

    /// Send a raw JSON payload unchanged.
    pub fn stream_raw(&self, json: &str) -> Result<(), LogError> {
        if self.transport.send_raw(json) {
            Ok(())
        } else {
            Err(LogError::Transport)
        }
    }

    /// Release the transport handle.
    pub fn close(&self) {
        self.transport.close();
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Decode a persisted log file and unwrap it into the mirror.
    pub fn read_log(&self, path: &Path) -> Result<(), LogError> {
        let root = logfile::read_log(path)?;
        self.unwrap(root)
    }

    fn encode_mode(&self) -> EncodeMode {
        if self.settings.pretty_printing {
            EncodeMode::Pretty
        } else {
            EncodeMode::Compact
        }
    }

    /// Persist the current mirror to `path`.
    pub fn write_log(&self, path: &Path) -> Result<(), LogError> {
        logfile::write_log(path, &self.wrap(), self.encode_mode())
    }

    /// Persist the current mirror to an auto-named file in `dir`, returning
    /// the chosen path.
    pub fn write_log_auto_named(&self, dir: &Path) -> Result<PathBuf, LogError> {
        let path = logfile::auto_named_path(dir, &self.settings.log_extension);
        logfile::write_log(&path, &self.wrap(), self.encode_mode())?;
        Ok(path)
    }

    /// Persist a concise human summary of the current mirror.
    pub fn write_simplified_log(&self, path: &Path) -> Result<(), LogError> {
        logfile::write_simplified(path, &self.wrap())
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Transport-driven delivery callback.
    ///
    /// With no registered listener, inbound messages are ignored entirely.
    /// For wrapper messages, every queued wrapper is drained and unwrapped
    /// in arrival order; the first failure stops the drain and suppresses
    /// the downstream notification. Errors never escape this callback.
    pub fn on_message(&self, kind: MessageKind) {
        if self.listener.lock().is_none() {
            tracing::trace!("no listener registered, ignoring inbound message");
            return;
        }
        match kind {
            MessageKind::Wrapper => {
                for root in self.transport.receive_all_queued() {
                    if let Err(e) = self.unwrap(root) {
                        tracing::warn!(
                            agent = %self.settings.agent,
                            error = %e,
                            "failed to unwrap queued wrapper, notification suppressed"
                        );
                        return;
                    }
                }
                self.notify(MessageKind::Wrapper);
            }
            other => self.notify(other),
        }
    }

    fn notify(&self, kind: MessageKind) {
        if let Some(listener) = self.listener.lock().as_ref() {
            listener.message_received(kind);
        }
    }
}

impl<T: Transport> StreamListener for LogStreamManager<T> {
    fn message_received(&self, kind: MessageKind) {
        self.on_message(kind);
    }
}
