//! Wire-level wrapper types.
//!
//! These structs serialize to the portable JSON log format exchanged between
//! an instrumentation agent and a visualization consumer. They carry no
//! semantics of their own; conversion into the typed model (and the semantic
//! validation that goes with it) happens in [`crate::wrapper::operation`] and
//! during [`crate::stream::LogStreamManager::unwrap`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema version written into headers produced by this crate.
pub const VERSION: &str = "1.0";

/// Version tag for headers whose producer did not declare one.
pub const VERSION_UNKNOWN: &str = "unknown";

/// The top-level envelope: an optional header and an optional operation list.
///
/// Either field may be absent. A header-only root announces or updates
/// structure declarations; a body-only root streams incremental operations
/// against previously declared structures. An absent body means "don't touch
/// operations"; an empty body means "zero operations this batch".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<RawOperation>>,
}

impl Root {
    pub fn new(header: Option<Header>, body: Option<Vec<RawOperation>>) -> Self {
        Self { header, body }
    }
}

/// Declares the set of known structures for a session, plus optional
/// source-code fragments keyed by structure identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub version: String,
    #[serde(rename = "annotatedVariables")]
    pub annotated_variables: BTreeMap<String, AnnotatedVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeMap<String, Vec<String>>>,
}

impl Header {
    pub fn new(
        annotated_variables: BTreeMap<String, AnnotatedVariable>,
        sources: Option<BTreeMap<String, Vec<String>>>,
    ) -> Self {
        Self {
            version: VERSION.to_string(),
            annotated_variables,
            sources,
        }
    }
}

/// One declared structure as it appears on the wire.
///
/// `raw_type` stays a plain string here so that an unknown tag survives
/// decoding; it is rejected with `UnknownStructure` when the declaration is
/// parsed into a [`crate::model::DataStructure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedVariable {
    pub identifier: String,
    pub raw_type: String,
    #[serde(default)]
    pub abstract_type: String,
    #[serde(default)]
    pub visual: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A (structure identifier, address) pair used to resolve an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub identifier: String,
    #[serde(default)]
    pub address: Vec<i32>,
}

impl Locator {
    pub fn new(identifier: impl Into<String>, address: Vec<i32>) -> Self {
        Self {
            identifier: identifier.into(),
            address,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:?}", self.identifier, self.address)
    }
}

/// One operation as it appears on the wire: a type tag plus whichever
/// locator slots the variant uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub op_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var1: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var2: Option<Locator>,
    #[serde(default)]
    pub value: Vec<f64>,
}
