//! PITR Save Format
//!
//! Wire-level types for the sandbox save document: one JSON object holding
//! map metadata plus `Blocks`/`Props`/`Enemies` arrays of placed-object
//! records. Field spellings match the file exactly (PascalCase keys,
//! per-category size fields). Value keys this editor does not recognize and
//! top-level fields it does not model are carried through flattened maps,
//! so a resave keeps whatever a newer game version wrote.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `BlockType` written on every block record. The game only ships one block
/// shape; the field is reserved.
pub const BLOCK_TYPE: i64 = 0;

/// Plain numeric triple. No invariants beyond finiteness.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vector3 = Vector3 { x: 1.0, y: 1.0, z: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation in the file's native convention (left-handed, Unity-style).
///
/// Stored exactly as read or exactly as produced by the editor-side
/// conversion; never normalized or validated here. The all-zero default is
/// what freshly placed objects carry until they are rotated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// One typed value inside a property group.
///
/// A well-formed option carries `Key` plus exactly one value key
/// (`FloatValue` or `BoolValue`). Anything else the game writes lands in
/// `extra` and is emitted back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataOption {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "FloatValue", default, skip_serializing_if = "Option::is_none")]
    pub float_value: Option<f64>,
    #[serde(rename = "BoolValue", default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A named property group as stored in a record's `Data` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataGroup {
    pub key: String,
    #[serde(default)]
    pub options: Vec<DataOption>,
}

/// One placed object.
///
/// Blocks size through `BlockSize` with `Scale` pinned to identity; props
/// and enemies size through `Scale` and never carry the block fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectRecord {
    #[serde(default)]
    pub object_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<Vector3>,
    #[serde(default)]
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Quaternion,
    #[serde(default)]
    pub scale: Vector3,
    #[serde(default)]
    pub kinematic: bool,
    #[serde(default)]
    pub data: Vec<DataGroup>,
}

/// The persisted document.
///
/// Absent object arrays parse as empty and are always written back, which
/// is what the game itself does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaveFile {
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub map_identifier: String,
    #[serde(default)]
    pub save_version: String,
    #[serde(default)]
    pub game_version: String,
    #[serde(default)]
    pub blocks: Vec<ObjectRecord>,
    #[serde(default)]
    pub props: Vec<ObjectRecord>,
    #[serde(default)]
    pub enemies: Vec<ObjectRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SaveFile {
    /// A blank document for a brand-new map.
    pub fn empty(map_name: &str) -> Self {
        SaveFile {
            map_name: map_name.to_string(),
            ..Default::default()
        }
    }
}

/// Error type for save-file round trips
#[derive(Debug)]
pub enum FormatError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Serialize(serde_json::Error),
}

impl From<std::io::Error> for FormatError {
    fn from(e: std::io::Error) -> Self {
        FormatError::Io(e)
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Io(e) => write!(f, "IO error: {}", e),
            FormatError::Parse(e) => write!(f, "Parse error: {}", e),
            FormatError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for FormatError {}

/// Parse a save document from JSON text.
pub fn parse_save(text: &str) -> Result<SaveFile, FormatError> {
    serde_json::from_str(text).map_err(FormatError::Parse)
}

/// Serialize a document to the compact JSON the game itself writes.
pub fn serialize_save(save: &SaveFile) -> Result<String, FormatError> {
    serde_json::to_string(save).map_err(FormatError::Serialize)
}

/// Load a save document from a file.
pub fn load_save_file<P: AsRef<Path>>(path: P) -> Result<SaveFile, FormatError> {
    let text = fs::read_to_string(path)?;
    parse_save(&text)
}

/// Write a save document to a file.
pub fn write_save_file<P: AsRef<Path>>(save: &SaveFile, path: P) -> Result<(), FormatError> {
    let text = serialize_save(save)?;
    fs::write(path, text)?;
    Ok(())
}
