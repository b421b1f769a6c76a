//! SANDMAN: data model and codec for PITR sandbox save files
//!
//! The save is a single JSON document: map metadata plus arrays of placed
//! blocks, props, and enemies, each carrying a schema-less list of typed
//! property groups. This crate owns the lossless round trip from file to
//! addressable objects and back, plus the quaternion convention conversion
//! editing needs. Rendering, cameras, and panels live with the host and
//! consume this crate's types.
//!
//! - [`sandbox::format`]: wire records and JSON round trip
//! - [`sandbox::object`]: per-object data model and property bag
//! - [`sandbox::manager`]: the owning collection for one open file
//! - [`sandbox::schema`]: per-type property declarations, fire-and-poll
//! - [`math`]: file quaternion to editor Euler and back
//! - [`logging`]: injectable diagnostics channels

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod logging;
pub mod math;
pub mod sandbox;

pub use logging::{FacadeSink, LogSink, Logger, MemorySink};
pub use math::{to_editor_euler, to_file_quaternion, EulerAngles};
pub use sandbox::{
    Category, ObjectId, PropKind, PropValue, Quaternion, SandboxError, SandboxManager,
    SandboxObject, SaveFile, SaveMetadata, SchemaProvider, Vector3,
};
