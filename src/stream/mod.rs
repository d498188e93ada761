pub mod logfile;
pub mod manager;
pub mod transport;

pub use logfile::DEFAULT_EXTENSION;
pub use manager::LogStreamManager;
pub use transport::{InMemoryTransport, MessageKind, StreamListener, Transport};
