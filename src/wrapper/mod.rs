pub mod codec;
pub mod operation;
pub mod root;

pub use codec::{decode, encode, EncodeMode};
pub use operation::{OpType, Operation};
pub use root::{AnnotatedVariable, Header, Locator, RawOperation, Root, VERSION, VERSION_UNKNOWN};
