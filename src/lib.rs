pub mod config;
pub mod error;
pub mod model;
pub mod stream;
pub mod wrapper;

pub use config::Settings;
pub use error::LogError;
pub use model::{Address, DataStructure, Element, OpKind, OperationCounter, RawType, VisualHint};
pub use stream::{InMemoryTransport, LogStreamManager, MessageKind, StreamListener, Transport};
pub use wrapper::{
    AnnotatedVariable, EncodeMode, Header, Locator, OpType, Operation, RawOperation, Root,
};
