//! Log-file persistence: full encoded form, simplified human summary, and
//! auto-generated file names.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::LogError;
use crate::wrapper::codec::{self, EncodeMode};
use crate::wrapper::operation::Operation;
use crate::wrapper::root::Root;

/// Default extension for auto-named log files.
pub const DEFAULT_EXTENSION: &str = "wrapper";

/// Write the encoded form of a root to `path`.
pub fn write_log(path: &Path, root: &Root, mode: EncodeMode) -> Result<(), LogError> {
    let bytes = codec::encode(root, mode)?;
    fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "wrote log file");
    Ok(())
}

/// Read and decode a persisted log file.
pub fn read_log(path: &Path) -> Result<Root, LogError> {
    let bytes = fs::read_to_string(path)?;
    codec::decode(&bytes)
}

/// Auto-generated path inside `dir`, named `YY-MM-DD_HHMMSS.<extension>`.
pub fn auto_named_path(dir: &Path, extension: &str) -> PathBuf {
    let stamp = Local::now().format("%y-%m-%d_%H%M%S");
    dir.join(format!("{stamp}.{extension}"))
}

/// Concise human summary: counts plus one line per declared variable and
/// per operation. Sacrifices completeness for readability.
pub fn simplified(root: &Root) -> String {
    let mut out = String::from(
        "This is a simplified version of the log. It sacrifices completeness for readability.\n\n",
    );
    match &root.header {
        Some(header) => {
            out.push_str(&format!(
                "Header: {} declared variables.\n",
                header.annotated_variables.len()
            ));
            for (i, av) in header.annotated_variables.values().enumerate() {
                let pretty = crate::model::RawType::parse(&av.raw_type)
                    .map(|rt| rt.pretty().to_string())
                    .unwrap_or_else(|| av.raw_type.clone());
                out.push_str(&format!("\t{}:\t\"{}\" ({pretty})\n", i + 1, av.identifier));
            }
        }
        None => out.push_str("Header: 0 declared variables.\n"),
    }
    match &root.body {
        Some(body) => {
            out.push_str(&format!("\nBody: {} operations.\n", body.len()));
            for (i, raw) in body.iter().enumerate() {
                let line = match Operation::from_raw(raw) {
                    Ok(op) => op.to_string(),
                    Err(_) => format!("?? {}", raw.op_type),
                };
                out.push_str(&format!("\t{}:\t\t{line}\n", i + 1));
            }
        }
        None => out.push_str("\nBody: 0 operations.\n"),
    }
    out
}

/// Write the simplified summary of a root to `path`.
pub fn write_simplified(path: &Path, root: &Root) -> Result<(), LogError> {
    fs::write(path, simplified(root))?;
    Ok(())
}
