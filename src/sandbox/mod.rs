//! Sandbox module - the save data model and its codec
//!
//! Load path: a parsed [`format::SaveFile`] goes into a [`SandboxManager`],
//! which builds one [`SandboxObject`] per record, tagged with its list's
//! [`Category`]. Edits happen on the objects; `export` flattens everything
//! back into a document. Fresh placements get their property bags from a
//! [`schema::SchemaProvider`], resolved fire-and-poll so nothing blocks.

pub mod format;
pub mod manager;
pub mod object;
pub mod schema;

pub use format::{FormatError, ObjectRecord, Quaternion, SaveFile, Vector3};
pub use manager::{SandboxManager, SaveMetadata};
pub use object::{Category, ObjectId, PropKind, PropValue, SandboxError, SandboxObject};
pub use schema::{DirSchemaProvider, MapSchemaProvider, ObjectSchema, SchemaError, SchemaProvider};
