//! Encode/decode between [`Root`] and its JSON wire form.

use crate::error::LogError;
use crate::wrapper::root::Root;

/// Output layout for [`encode`]. The mode changes byte layout only, never
/// decoded semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Minimal size, the default.
    #[default]
    Compact,
    /// Indented, human-readable output for debugging.
    Pretty,
}

/// Serialize a root to wire bytes. Deterministic for identical input: all
/// wire maps are ordered.
pub fn encode(root: &Root, mode: EncodeMode) -> Result<String, LogError> {
    let out = match mode {
        EncodeMode::Compact => serde_json::to_string(root)?,
        EncodeMode::Pretty => serde_json::to_string_pretty(root)?,
    };
    Ok(out)
}

/// Parse wire bytes into a root.
///
/// Fails with [`LogError::Malformed`] on syntactically invalid input.
/// Semantic consistency (dangling locators, unknown raw types) is not
/// checked here; that is deferred to unwrap/replay.
pub fn decode(input: &str) -> Result<Root, LogError> {
    Ok(serde_json::from_str(input)?)
}
