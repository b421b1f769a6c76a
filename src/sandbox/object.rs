//! Sandbox Objects
//!
//! Everything the save knows about one placed object: stable identity,
//! transform in file convention, category-routed size semantics, and the
//! schema-less property bag parsed out of the record's `Data` array.
//! Groups and options keep declaration order so a resave emits them exactly
//! as they were read: the file format is order-independent, but real files
//! and the panel layer are not.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::Logger;
use crate::sandbox::format::{
    DataGroup, DataOption, ObjectRecord, Quaternion, Vector3, BLOCK_TYPE,
};
use crate::sandbox::schema::{SchemaProvider, SchemaTicket};

/// Counter behind [`ObjectId`]; ids only need to be unique within a session.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn next_object_id() -> ObjectId {
    ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::SeqCst))
}

/// Stable per-object identity, assigned at construction.
///
/// Two structurally equal objects still compare unequal by id; update and
/// remove key on this, never on field equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which list an object lives in.
///
/// Fixed at construction. Picks the size field (`BlockSize` for blocks,
/// `Scale` otherwise) and the record shape written on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Block,
    Prop,
    Enemy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Block => "block",
            Category::Prop => "prop",
            Category::Enemy => "enemy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Category::Block),
            "prop" => Ok(Category::Prop),
            "enemy" => Ok(Category::Enemy),
            other => Err(SandboxError::InvalidCategory(other.to_string())),
        }
    }
}

/// Declared kind of a property option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Float,
    Bool,
}

impl PropKind {
    /// The value key this kind uses on the wire.
    pub fn value_key(&self) -> &'static str {
        match self {
            PropKind::Float => "FloatValue",
            PropKind::Bool => "BoolValue",
        }
    }

    pub fn from_value_key(key: &str) -> Option<PropKind> {
        match key {
            "FloatValue" => Some(PropKind::Float),
            "BoolValue" => Some(PropKind::Bool),
            _ => None,
        }
    }
}

/// A property option's payload.
///
/// `Other` holds the value keys of an option this editor does not
/// recognize, verbatim, so saving cannot drop a future property type. It
/// may be empty for a bare `{Key}` option.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Float(f64),
    Bool(bool),
    Other(serde_json::Map<String, serde_json::Value>),
}

impl PropValue {
    /// The declared kind; `None` for opaque payloads.
    pub fn kind(&self) -> Option<PropKind> {
        match self {
            PropValue::Float(_) => Some(PropKind::Float),
            PropValue::Bool(_) => Some(PropKind::Bool),
            PropValue::Other(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Label used in diagnostics.
    fn label(&self) -> String {
        match self {
            PropValue::Float(_) => PropKind::Float.value_key().to_string(),
            PropValue::Bool(_) => PropKind::Bool.value_key().to_string(),
            PropValue::Other(map) => map
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| "opaque".to_string()),
        }
    }
}

/// One named option inside a group.
#[derive(Debug, Clone, PartialEq)]
struct PropEntry {
    name: String,
    value: PropValue,
}

/// A declared property group; entries keep declaration order.
#[derive(Debug, Clone, PartialEq)]
struct PropGroup {
    name: String,
    entries: Vec<PropEntry>,
}

/// Error type for object and property operations
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxError {
    /// A category name the file format does not know
    InvalidCategory(String),
    /// Property group was never declared
    MissingPropGroup(String),
    /// Option absent from a declared group
    MissingProp { group: String, option: String },
    /// Written value does not match the declared kind
    TypeMismatch {
        group: String,
        option: String,
        expected: String,
        got: String,
    },
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::InvalidCategory(name) => write!(f, "unknown category '{}'", name),
            SandboxError::MissingPropGroup(group) => write!(f, "no PropGroup '{}'", group),
            SandboxError::MissingProp { group, option } => {
                write!(f, "no property at {}/{}", group, option)
            }
            SandboxError::TypeMismatch {
                group,
                option,
                expected,
                got,
            } => write!(
                f,
                "property {}/{} expected {} got {}",
                group, option, expected, got
            ),
        }
    }
}

impl std::error::Error for SandboxError {}

/// One placed block, prop, or enemy.
///
/// Transform and size are public and always stored in file convention; use
/// the `math` module to present rotations for editing. The property bag is
/// only reachable through the accessors so declaration order and the
/// group-before-option invariant hold.
#[derive(Debug)]
pub struct SandboxObject {
    id: ObjectId,
    type_id: String,
    category: Category,
    pub position: Vector3,
    pub rotation: Quaternion,
    /// Block size for blocks, scale for everything else.
    pub size: Vector3,
    /// Maps to the file's `Kinematic` flag.
    pub frozen: bool,
    props: Vec<PropGroup>,
    pending_schema: Option<SchemaTicket>,
    log: Logger,
}

impl SandboxObject {
    /// Parse an object straight out of a save record.
    ///
    /// Synchronous, no schema lookup: the bag holds exactly what the file
    /// declared, including options of types this editor predates.
    pub fn from_record(record: &ObjectRecord, category: Category, log: Logger) -> SandboxObject {
        let size = match category {
            Category::Block => match record.block_size {
                Some(size) => size,
                None => {
                    log.warn(&format!(
                        "Block '{}' has no BlockSize; size left at zero",
                        record.object_identifier
                    ));
                    Vector3::ZERO
                }
            },
            Category::Prop | Category::Enemy => record.scale,
        };

        let mut object = SandboxObject {
            id: next_object_id(),
            type_id: record.object_identifier.clone(),
            category,
            position: record.position,
            rotation: record.rotation,
            size,
            frozen: record.kinematic,
            props: Vec::new(),
            pending_schema: None,
            log,
        };

        for group in &record.data {
            object.add_prop_group(&group.key);
            for option in &group.options {
                let value = object.decode_option(&group.key, option);
                object.add_prop(&group.key, &option.key, value);
            }
        }

        object
    }

    /// A brand-new object of `type_id`.
    ///
    /// Usable immediately with an empty property bag; the bag fills in once
    /// the provider's answer is pumped through [`poll_schema`].
    ///
    /// [`poll_schema`]: SandboxObject::poll_schema
    pub fn new(
        type_id: impl Into<String>,
        category: Category,
        provider: &dyn SchemaProvider,
        log: Logger,
    ) -> SandboxObject {
        let type_id = type_id.into();
        log.info(&format!("Loading config file for Object '{}'", type_id));
        let ticket = provider.request(&type_id);

        SandboxObject {
            id: next_object_id(),
            type_id,
            category,
            position: Vector3::ZERO,
            rotation: Quaternion::default(),
            size: Vector3::ZERO,
            frozen: false,
            props: Vec::new(),
            pending_schema: Some(ticket),
            log,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// True while a schema request is still in flight; readers must expect
    /// an empty bag until this clears.
    pub fn is_resolving(&self) -> bool {
        self.pending_schema.is_some()
    }

    /// Pump the pending schema request.
    ///
    /// Returns true once the request has settled (either way). A failed
    /// lookup leaves the bag empty and logs a warning; it never fails the
    /// object.
    pub fn poll_schema(&mut self) -> bool {
        let outcome = match self.pending_schema.as_mut() {
            None => return true,
            Some(ticket) => match ticket.poll() {
                None => return false,
                Some(outcome) => outcome,
            },
        };
        self.pending_schema = None;

        match outcome {
            Ok(schema) => {
                for group in &schema.groups {
                    self.add_prop_group(&group.name);
                    for option in &group.options {
                        self.add_prop(&group.name, &option.name, option.default.clone());
                    }
                }
            }
            Err(err) => {
                self.log.warn(&format!(
                    "No object config was found for type {} ({}). Was a new object added to the game?",
                    self.type_id, err
                ));
            }
        }
        true
    }

    /// Declare (or reset) a property group.
    ///
    /// An existing group is cleared in place and keeps its position in
    /// declaration order.
    pub fn add_prop_group(&mut self, name: &str) {
        self.log.info(&format!("Added PropGroup {}", name));
        match self.props.iter_mut().find(|group| group.name == name) {
            Some(group) => group.entries.clear(),
            None => self.props.push(PropGroup {
                name: name.to_string(),
                entries: Vec::new(),
            }),
        }
    }

    /// Insert an option under an already-declared group.
    ///
    /// There is no implicit group creation: an undeclared group is logged
    /// and the call is a no-op.
    pub fn add_prop(&mut self, group: &str, option: &str, value: PropValue) {
        let Some(found) = self.props.iter_mut().find(|g| g.name == group) else {
            self.log.error(&format!(
                "No PropGroup '{}' to hold option '{}'",
                group, option
            ));
            return;
        };

        self.log
            .info(&format!("Added PropOption at path {}/{}", group, option));
        match found.entries.iter_mut().find(|entry| entry.name == option) {
            Some(entry) => entry.value = value,
            None => found.entries.push(PropEntry {
                name: option.to_string(),
                value,
            }),
        }
    }

    /// Group names in declaration order.
    pub fn prop_groups(&self) -> Vec<&str> {
        self.props.iter().map(|group| group.name.as_str()).collect()
    }

    /// Option names of one group in declaration order.
    ///
    /// An absent group is logged and returns empty.
    pub fn prop_group_options(&self, group: &str) -> Vec<&str> {
        match self.props.iter().find(|g| g.name == group) {
            Some(found) => found
                .entries
                .iter()
                .map(|entry| entry.name.as_str())
                .collect(),
            None => {
                self.log.error(&format!("No PropGroup '{}' was found", group));
                Vec::new()
            }
        }
    }

    /// Read an option's value. Absent group or option is logged and `None`.
    pub fn get_prop_value(&self, group: &str, option: &str) -> Option<&PropValue> {
        let value = self
            .props
            .iter()
            .find(|g| g.name == group)
            .and_then(|g| g.entries.iter().find(|entry| entry.name == option))
            .map(|entry| &entry.value);
        if value.is_none() {
            self.log
                .error(&format!("No property at {}/{} was found", group, option));
        }
        value
    }

    /// Write an option's value.
    ///
    /// The new value must match the declared kind; a mismatch (or a write to
    /// an opaque option) is logged and leaves the stored value untouched.
    pub fn set_prop_value(
        &mut self,
        group: &str,
        option: &str,
        value: PropValue,
    ) -> Result<(), SandboxError> {
        let Some(found) = self.props.iter_mut().find(|g| g.name == group) else {
            let err = SandboxError::MissingPropGroup(group.to_string());
            self.log.error(&err.to_string());
            return Err(err);
        };
        let Some(entry) = found.entries.iter_mut().find(|entry| entry.name == option) else {
            let err = SandboxError::MissingProp {
                group: group.to_string(),
                option: option.to_string(),
            };
            self.log.error(&err.to_string());
            return Err(err);
        };

        match (entry.value.kind(), value.kind()) {
            (Some(expected), Some(got)) if expected == got => {
                entry.value = value;
                Ok(())
            }
            _ => {
                let err = SandboxError::TypeMismatch {
                    group: group.to_string(),
                    option: option.to_string(),
                    expected: entry.value.label(),
                    got: value.label(),
                };
                self.log.error(&err.to_string());
                Err(err)
            }
        }
    }

    /// Flatten back into the record shape the file stores.
    ///
    /// Blocks write their size through `BlockSize` with `Scale` pinned to
    /// identity; the game ignores block `Scale` and expects ones there.
    pub fn to_record(&self) -> ObjectRecord {
        let mut record = ObjectRecord {
            object_identifier: self.type_id.clone(),
            position: self.position,
            rotation: self.rotation,
            scale: self.size,
            kinematic: self.frozen,
            ..Default::default()
        };

        if self.category == Category::Block {
            record.block_type = Some(BLOCK_TYPE);
            record.block_size = Some(self.size);
            record.scale = Vector3::ONE;
        }

        record.data = self
            .props
            .iter()
            .map(|group| DataGroup {
                key: group.name.clone(),
                options: group.entries.iter().map(encode_option).collect(),
            })
            .collect();

        record
    }

    /// Resolve an option record to a typed value.
    ///
    /// Scan order is FloatValue then BoolValue; when a record carries both,
    /// the one scanned last wins. Unrecognized value keys are kept verbatim.
    fn decode_option(&self, group: &str, option: &DataOption) -> PropValue {
        if option.float_value.is_some() && option.bool_value.is_some() {
            self.log.warn(&format!(
                "Option {}/{} carries FloatValue and BoolValue; keeping BoolValue",
                group, option.key
            ));
        }

        if let Some(value) = option.bool_value {
            PropValue::Bool(value)
        } else if let Some(value) = option.float_value {
            PropValue::Float(value)
        } else {
            PropValue::Other(option.extra.clone())
        }
    }
}

fn encode_option(entry: &PropEntry) -> DataOption {
    let mut option = DataOption {
        key: entry.name.clone(),
        ..Default::default()
    };
    match &entry.value {
        PropValue::Float(value) => option.float_value = Some(*value),
        PropValue::Bool(value) => option.bool_value = Some(*value),
        PropValue::Other(extra) => option.extra = extra.clone(),
    }
    option
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogSink, MemorySink};
    use crate::sandbox::schema::MapSchemaProvider;
    use std::sync::Arc;

    fn test_logger() -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Logger::new("SandboxObject", sink.clone() as Arc<dyn LogSink>), sink)
    }

    fn block_record() -> ObjectRecord {
        ObjectRecord {
            object_identifier: "ultrakill.brush-metal".to_string(),
            block_size: Some(Vector3::new(2.0, 3.0, 4.0)),
            scale: Vector3::ONE,
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::IDENTITY,
            ..Default::default()
        }
    }

    fn breakable_prop_record() -> ObjectRecord {
        ObjectRecord {
            object_identifier: "ultrakill.barrel".to_string(),
            scale: Vector3::new(1.5, 1.5, 1.5),
            kinematic: true,
            data: vec![DataGroup {
                key: "breakable".to_string(),
                options: vec![
                    DataOption {
                        key: "weak".to_string(),
                        bool_value: Some(true),
                        ..Default::default()
                    },
                    DataOption {
                        key: "unbreakable".to_string(),
                        bool_value: Some(false),
                        ..Default::default()
                    },
                ],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_block_size_routed_from_block_size_field() {
        let (log, _) = test_logger();
        let object = SandboxObject::from_record(&block_record(), Category::Block, log);

        assert_eq!(object.size, Vector3::new(2.0, 3.0, 4.0));
        assert_eq!(object.category(), Category::Block);
        assert!(!object.frozen);
    }

    #[test]
    fn test_prop_size_routed_from_scale_field() {
        let (log, _) = test_logger();
        let object =
            SandboxObject::from_record(&breakable_prop_record(), Category::Prop, log);

        assert_eq!(object.size, Vector3::new(1.5, 1.5, 1.5));
        assert!(object.frozen);
        assert_eq!(
            object.get_prop_value("breakable", "weak"),
            Some(&PropValue::Bool(true))
        );
        assert_eq!(
            object.get_prop_value("breakable", "unbreakable"),
            Some(&PropValue::Bool(false))
        );
    }

    #[test]
    fn test_block_record_normalizes_scale() {
        let (log, _) = test_logger();
        let object = SandboxObject::from_record(&block_record(), Category::Block, log);
        let record = object.to_record();

        assert_eq!(record.block_type, Some(BLOCK_TYPE));
        assert_eq!(record.block_size, Some(Vector3::new(2.0, 3.0, 4.0)));
        assert_eq!(record.scale, Vector3::ONE);
    }

    #[test]
    fn test_record_round_trip() {
        let (log, _) = test_logger();
        let object =
            SandboxObject::from_record(&breakable_prop_record(), Category::Prop, log.clone());
        let record = object.to_record();
        let reparsed = SandboxObject::from_record(&record, Category::Prop, log);

        assert_eq!(reparsed.type_id(), object.type_id());
        assert_eq!(reparsed.position, object.position);
        assert_eq!(reparsed.rotation, object.rotation);
        assert_eq!(reparsed.size, object.size);
        assert_eq!(reparsed.frozen, object.frozen);
        assert_eq!(reparsed.prop_groups(), object.prop_groups());
        assert_eq!(
            reparsed.get_prop_value("breakable", "weak"),
            object.get_prop_value("breakable", "weak")
        );
        // ids are identities, not data
        assert_ne!(reparsed.id(), object.id());
    }

    #[test]
    fn test_add_prop_without_group_is_noop() {
        let (log, sink) = test_logger();
        let mut object = SandboxObject::from_record(&block_record(), Category::Block, log);

        object.add_prop("nope", "option", PropValue::Float(1.0));

        assert!(object.prop_groups().is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn test_add_prop_group_overwrites() {
        let (log, _) = test_logger();
        let mut object = SandboxObject::from_record(&block_record(), Category::Block, log);

        object.add_prop_group("physics");
        object.add_prop("physics", "mass", PropValue::Float(2.0));
        object.add_prop_group("sound");
        object.add_prop_group("physics");

        // reset in place, position kept
        assert_eq!(object.prop_groups(), vec!["physics", "sound"]);
        assert!(object.prop_group_options("physics").is_empty());
    }

    #[test]
    fn test_get_absent_prop_returns_none_and_logs() {
        let (log, sink) = test_logger();
        let object = SandboxObject::from_record(&block_record(), Category::Block, log);

        assert!(object.get_prop_value("missing", "thing").is_none());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn test_set_prop_value_rejects_type_mismatch() {
        let (log, sink) = test_logger();
        let mut object =
            SandboxObject::from_record(&breakable_prop_record(), Category::Prop, log);

        let result = object.set_prop_value("breakable", "weak", PropValue::Float(1.0));
        assert!(matches!(result, Err(SandboxError::TypeMismatch { .. })));
        // stored value untouched
        assert_eq!(
            object.get_prop_value("breakable", "weak"),
            Some(&PropValue::Bool(true))
        );
        assert_eq!(sink.error_count(), 1);

        assert!(object
            .set_prop_value("breakable", "weak", PropValue::Bool(false))
            .is_ok());
        assert_eq!(
            object.get_prop_value("breakable", "weak"),
            Some(&PropValue::Bool(false))
        );
    }

    #[test]
    fn test_set_prop_value_missing_paths() {
        let (log, _) = test_logger();
        let mut object =
            SandboxObject::from_record(&breakable_prop_record(), Category::Prop, log);

        assert!(matches!(
            object.set_prop_value("nope", "weak", PropValue::Bool(true)),
            Err(SandboxError::MissingPropGroup(_))
        ));
        assert!(matches!(
            object.set_prop_value("breakable", "nope", PropValue::Bool(true)),
            Err(SandboxError::MissingProp { .. })
        ));
    }

    #[test]
    fn test_dual_value_keys_last_scanned_wins() {
        let (log, sink) = test_logger();
        let mut record = breakable_prop_record();
        record.data[0].options[0].float_value = Some(5.0);

        let object = SandboxObject::from_record(&record, Category::Prop, log);
        assert_eq!(
            object.get_prop_value("breakable", "weak"),
            Some(&PropValue::Bool(true))
        );
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn test_unknown_value_key_round_trips() {
        let (log, _) = test_logger();
        let mut record = breakable_prop_record();
        let mut extra = serde_json::Map::new();
        extra.insert("IntValue".to_string(), serde_json::json!(7));
        record.data[0].options.push(DataOption {
            key: "count".to_string(),
            extra,
            ..Default::default()
        });

        let object = SandboxObject::from_record(&record, Category::Prop, log);
        let out = object.to_record();
        let emitted = &out.data[0].options[2];
        assert_eq!(emitted.key, "count");
        assert_eq!(emitted.extra.get("IntValue"), Some(&serde_json::json!(7)));

        // and it cannot be overwritten with a typed value
        let (log, _) = test_logger();
        let mut object = SandboxObject::from_record(&out, Category::Prop, log);
        assert!(matches!(
            object.set_prop_value("breakable", "count", PropValue::Float(1.0)),
            Err(SandboxError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_fresh_object_resolves_schema() {
        let (log, _) = test_logger();
        let mut provider = MapSchemaProvider::new();
        provider.insert(
            "ultrakill.melon",
            crate::sandbox::schema::ObjectSchema::parse(
                r#"{"Props": {"fruit": {
                    "ripeness": {"type": "FloatValue", "defaultValue": 0.5},
                    "explosive": {"type": "BoolValue", "defaultValue": false}
                }}}"#,
            )
            .unwrap(),
        );

        let mut object = SandboxObject::new("ultrakill.melon", Category::Prop, &provider, log);
        assert!(object.is_resolving());
        assert!(object.prop_groups().is_empty());

        assert!(object.poll_schema());
        assert!(!object.is_resolving());
        assert_eq!(object.prop_groups(), vec!["fruit"]);
        assert_eq!(
            object.prop_group_options("fruit"),
            vec!["ripeness", "explosive"]
        );
        assert_eq!(
            object.get_prop_value("fruit", "ripeness"),
            Some(&PropValue::Float(0.5))
        );
    }

    #[test]
    fn test_fresh_object_survives_unknown_type() {
        let (log, sink) = test_logger();
        let provider = MapSchemaProvider::new();

        let mut object = SandboxObject::new("ultrakill.mystery", Category::Enemy, &provider, log);
        assert!(object.poll_schema());
        assert!(object.prop_groups().is_empty());
        assert_eq!(sink.warning_count(), 1);
        // settled; further polls are no-ops
        assert!(object.poll_schema());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn test_invalid_category_string() {
        assert_eq!("block".parse::<Category>(), Ok(Category::Block));
        assert_eq!("enemy".parse::<Category>(), Ok(Category::Enemy));
        assert!(matches!(
            "trigger".parse::<Category>(),
            Err(SandboxError::InvalidCategory(_))
        ));
    }
}
