pub mod element;
pub mod structure;

pub use element::{Address, Element, OpKind, OperationCounter};
pub use structure::{DataStructure, RawType, VisualHint};
