//! Object Config Schemas
//!
//! Per-type property declarations live outside the editor as JSON config
//! files keyed by type id. Lookups are fire-and-poll: `request` returns a
//! ticket immediately and the caller pumps it each frame, so placing an
//! object never blocks even when the config comes off disk. A failed
//! lookup settles the ticket with an error; it is never an unhandled
//! failure.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use serde_json::Value;

use crate::sandbox::object::{PropKind, PropValue};

/// Declared default for one option.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaOption {
    pub name: String,
    pub default: PropValue,
}

/// A declared group of options, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaGroup {
    pub name: String,
    pub options: Vec<SchemaOption>,
}

/// Everything a type id declares about its property bag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub groups: Vec<SchemaGroup>,
}

impl ObjectSchema {
    /// Parse the external config shape:
    ///
    /// ```json
    /// { "Props": { "group": { "option": { "type": "FloatValue", "defaultValue": 1.0 } } } }
    /// ```
    ///
    /// Group and option order follows the file.
    pub fn parse(text: &str) -> Result<ObjectSchema, SchemaError> {
        let root: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
        let props = root
            .get("Props")
            .ok_or_else(|| SchemaError::BadDeclaration("missing Props".to_string()))?;
        let Value::Object(props) = props else {
            return Err(SchemaError::BadDeclaration("Props is not an object".to_string()));
        };

        let mut groups = Vec::new();
        for (group_name, options_value) in props {
            let Value::Object(options) = options_value else {
                return Err(SchemaError::BadDeclaration(format!(
                    "group '{}' is not an object",
                    group_name
                )));
            };

            let mut parsed = Vec::new();
            for (option_name, declaration) in options {
                parsed.push(SchemaOption {
                    name: option_name.clone(),
                    default: parse_declaration(group_name, option_name, declaration)?,
                });
            }
            groups.push(SchemaGroup {
                name: group_name.clone(),
                options: parsed,
            });
        }

        Ok(ObjectSchema { groups })
    }
}

fn parse_declaration(group: &str, option: &str, declaration: &Value) -> Result<PropValue, SchemaError> {
    let bad = |what: &str| {
        SchemaError::BadDeclaration(format!("option {}/{}: {}", group, option, what))
    };

    let type_key = declaration
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad("missing type"))?;
    let default = declaration.get("defaultValue");

    match PropKind::from_value_key(type_key) {
        Some(PropKind::Float) => default
            .and_then(Value::as_f64)
            .map(PropValue::Float)
            .ok_or_else(|| bad("defaultValue is not a number")),
        Some(PropKind::Bool) => default
            .and_then(Value::as_bool)
            .map(PropValue::Bool)
            .ok_or_else(|| bad("defaultValue is not a bool")),
        None => Err(bad(&format!("unknown type '{}'", type_key))),
    }
}

/// Error type for schema lookups
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// No config exists for the type id
    NotFound(String),
    Io(String),
    Parse(String),
    /// Config parsed as JSON but does not declare properties correctly
    BadDeclaration(String),
    /// Provider dropped the request without answering
    Unavailable,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::NotFound(type_id) => write!(f, "no config for type '{}'", type_id),
            SchemaError::Io(msg) => write!(f, "IO error: {}", msg),
            SchemaError::Parse(msg) => write!(f, "parse error: {}", msg),
            SchemaError::BadDeclaration(msg) => write!(f, "bad declaration: {}", msg),
            SchemaError::Unavailable => write!(f, "provider dropped the request"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Poll handle for one schema request.
///
/// The request is in flight until [`poll`] returns `Some`; after that the
/// ticket is spent and belongs in the bin.
///
/// [`poll`]: SchemaTicket::poll
#[derive(Debug)]
pub struct SchemaTicket {
    receiver: Receiver<Result<ObjectSchema, SchemaError>>,
}

impl SchemaTicket {
    /// Wrap a receiver the provider will answer on.
    pub fn from_receiver(receiver: Receiver<Result<ObjectSchema, SchemaError>>) -> Self {
        Self { receiver }
    }

    /// A ticket that settles on the first poll.
    pub fn resolved(result: Result<ObjectSchema, SchemaError>) -> Self {
        let (sender, receiver) = channel();
        let _ = sender.send(result);
        Self { receiver }
    }

    /// Non-blocking check; `Some` when the request has settled.
    ///
    /// A provider that went away (dropped sender, panicked thread) settles
    /// as [`SchemaError::Unavailable`] rather than surfacing a panic.
    pub fn poll(&mut self) -> Option<Result<ObjectSchema, SchemaError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SchemaError::Unavailable)),
        }
    }
}

/// Source of per-type property declarations.
///
/// `request` must return immediately; resolution happens on the ticket.
pub trait SchemaProvider: Send + Sync {
    fn request(&self, type_id: &str) -> SchemaTicket;
}

/// Reads `<dir>/<type-id>.json` on a background thread.
#[derive(Debug, Clone)]
pub struct DirSchemaProvider {
    dir: PathBuf,
}

impl DirSchemaProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SchemaProvider for DirSchemaProvider {
    fn request(&self, type_id: &str) -> SchemaTicket {
        let path = self.dir.join(format!("{}.json", type_id));
        let type_id = type_id.to_string();
        let (sender, receiver) = channel();

        thread::spawn(move || {
            let _ = sender.send(load_schema_file(&path, &type_id));
        });

        SchemaTicket::from_receiver(receiver)
    }
}

fn load_schema_file(path: &Path, type_id: &str) -> Result<ObjectSchema, SchemaError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SchemaError::NotFound(type_id.to_string()))
        }
        Err(err) => return Err(SchemaError::Io(err.to_string())),
    };
    ObjectSchema::parse(&text)
}

/// In-memory provider for tests and embedded catalogs.
#[derive(Debug, Clone, Default)]
pub struct MapSchemaProvider {
    schemas: HashMap<String, ObjectSchema>,
}

impl MapSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_id: impl Into<String>, schema: ObjectSchema) {
        self.schemas.insert(type_id.into(), schema);
    }
}

impl SchemaProvider for MapSchemaProvider {
    fn request(&self, type_id: &str) -> SchemaTicket {
        SchemaTicket::resolved(
            self.schemas
                .get(type_id)
                .cloned()
                .ok_or_else(|| SchemaError::NotFound(type_id.to_string())),
        )
    }
}
