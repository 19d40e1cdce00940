//! Typed decoding of engine payloads.
//!
//! Engines hosted behind a serialization boundary (a wasm bridge, a child
//! process) hand back JSON. Each payload is decoded exactly once, here, into
//! the records from [`super::engine`]; errors carry the JSON path of the
//! offending value.

use super::engine::ImportTable;
use crate::{DebuggerError, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Decode `json` into `T`, naming `what` in the error.
///
/// Records with a fixed shape (`Vec<Mapping>`, `Vec<Instruction>`,
/// `CpuState`) decode directly through this; only tables keyed by address
/// need a dedicated parser.
pub fn decode<T: DeserializeOwned>(what: &str, json: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(de).map_err(|e| {
        DebuggerError::Schema(format!("{} at `{}`: {}", what, e.path(), e.inner())).into()
    })
}

/// Decode a symbol table: a JSON object keyed by address.
///
/// Keys are decimal (`"4198400"`) or `0x`-prefixed hex (`"0x401000"`).
pub fn parse_import_table(json: &str) -> Result<ImportTable> {
    let raw: BTreeMap<String, String> = decode("import table", json)?;
    raw.into_iter()
        .map(|(key, name)| Ok((parse_address_key(&key)?, name)))
        .collect()
}

/// Caller-supplied label files share the import table layout.
pub fn parse_labels(json: &str) -> Result<BTreeMap<u32, String>> {
    parse_import_table(json)
}

pub(crate) fn parse_address_key(key: &str) -> Result<u32> {
    let parsed = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => key.parse::<u32>(),
    };
    parsed.map_err(|e| DebuggerError::Schema(format!("bad address key {:?}: {}", key, e)).into())
}
