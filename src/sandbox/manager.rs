//! Sandbox Manager
//!
//! Owns everything a loaded save contains: map metadata plus the block,
//! prop, and enemy lists. One manager per open file; loading replaces the
//! whole state. Edits flow through add/update/remove and the live list
//! views, and `export` flattens the current state back into a document.
//! All editor tools reference this manager rather than owning copies.

use std::sync::Arc;

use crate::logging::{LogSink, Logger};
use crate::sandbox::format::{ObjectRecord, SaveFile};
use crate::sandbox::object::{Category, ObjectId, SandboxObject};
use crate::sandbox::schema::SchemaProvider;

/// Save-level header fields, carried verbatim.
///
/// Versions are recorded, never interpreted. `extra` keeps top-level fields
/// this editor does not model so a resave keeps them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveMetadata {
    pub map_name: String,
    pub map_identifier: String,
    pub save_version: String,
    pub game_version: String,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The single owner of the in-memory edit state.
pub struct SandboxManager {
    metadata: SaveMetadata,
    blocks: Vec<SandboxObject>,
    props: Vec<SandboxObject>,
    enemies: Vec<SandboxObject>,
    provider: Arc<dyn SchemaProvider>,
    log: Logger,
}

impl SandboxManager {
    pub fn new(provider: Arc<dyn SchemaProvider>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            metadata: SaveMetadata::default(),
            blocks: Vec::new(),
            props: Vec::new(),
            enemies: Vec::new(),
            provider,
            log: Logger::new("SandboxManager", sink),
        }
    }

    /// Replace all state with the contents of a parsed save document.
    ///
    /// Objects keep file order. Not incremental: whatever was loaded or
    /// edited before is gone.
    pub fn load(&mut self, save: SaveFile) {
        self.metadata = SaveMetadata {
            map_name: save.map_name,
            map_identifier: save.map_identifier,
            save_version: save.save_version,
            game_version: save.game_version,
            extra: save.extra,
        };
        self.blocks = self.parse_list(&save.blocks, Category::Block);
        self.props = self.parse_list(&save.props, Category::Prop);
        self.enemies = self.parse_list(&save.enemies, Category::Enemy);

        self.log.info(&format!(
            "Loaded map '{}': {} blocks, {} props, {} enemies",
            self.metadata.map_name,
            self.blocks.len(),
            self.props.len(),
            self.enemies.len()
        ));
    }

    pub fn metadata(&self) -> &SaveMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut SaveMetadata {
        &mut self.metadata
    }

    /// Place a fresh object and hand it back.
    ///
    /// The object joins its list immediately; only its property bag resolves
    /// later, through [`poll_pending`]. Nothing here can lose the object to
    /// resolution timing.
    ///
    /// [`poll_pending`]: SandboxManager::poll_pending
    pub fn add_new(&mut self, category: Category, type_id: &str) -> &mut SandboxObject {
        let object = SandboxObject::new(type_id, category, self.provider.as_ref(), self.object_logger());
        let list = self.list_mut(category);
        list.push(object);
        let index = list.len() - 1;
        &mut list[index]
    }

    /// Swap the object with `id` for `replacement`.
    ///
    /// The replacement keeps its own id. An unknown id is logged and leaves
    /// the list untouched.
    pub fn update(&mut self, category: Category, id: ObjectId, replacement: SandboxObject) -> bool {
        let index = self.list_mut(category).iter().position(|o| o.id() == id);
        match index {
            Some(index) => {
                self.list_mut(category)[index] = replacement;
                true
            }
            None => {
                self.log
                    .warn(&format!("No {} object {} to update", category, id));
                false
            }
        }
    }

    /// Remove and return the object with `id`.
    ///
    /// An unknown id is logged and leaves the list untouched.
    pub fn remove(&mut self, category: Category, id: ObjectId) -> Option<SandboxObject> {
        let index = self.list_mut(category).iter().position(|o| o.id() == id);
        match index {
            Some(index) => Some(self.list_mut(category).remove(index)),
            None => {
                self.log
                    .warn(&format!("No {} object {} to remove", category, id));
                None
            }
        }
    }

    /// Live view of one list, in file/placement order.
    pub fn objects(&self, category: Category) -> &[SandboxObject] {
        self.list(category)
    }

    /// Mutable live view of one list.
    pub fn objects_mut(&mut self, category: Category) -> &mut [SandboxObject] {
        self.list_mut(category)
    }

    pub fn get(&self, category: Category, id: ObjectId) -> Option<&SandboxObject> {
        self.list(category).iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, category: Category, id: ObjectId) -> Option<&mut SandboxObject> {
        self.list_mut(category).iter_mut().find(|o| o.id() == id)
    }

    /// Pump every in-flight schema request. Returns how many settled.
    pub fn poll_pending(&mut self) -> usize {
        let mut settled = 0;
        for object in self
            .blocks
            .iter_mut()
            .chain(self.props.iter_mut())
            .chain(self.enemies.iter_mut())
        {
            if object.is_resolving() && object.poll_schema() {
                settled += 1;
            }
        }
        settled
    }

    /// Flatten the current edit state into a persistable document.
    pub fn export(&self) -> SaveFile {
        SaveFile {
            map_name: self.metadata.map_name.clone(),
            map_identifier: self.metadata.map_identifier.clone(),
            save_version: self.metadata.save_version.clone(),
            game_version: self.metadata.game_version.clone(),
            blocks: self.blocks.iter().map(SandboxObject::to_record).collect(),
            props: self.props.iter().map(SandboxObject::to_record).collect(),
            enemies: self.enemies.iter().map(SandboxObject::to_record).collect(),
            extra: self.metadata.extra.clone(),
        }
    }

    fn parse_list(&self, records: &[ObjectRecord], category: Category) -> Vec<SandboxObject> {
        records
            .iter()
            .map(|record| SandboxObject::from_record(record, category, self.object_logger()))
            .collect()
    }

    fn object_logger(&self) -> Logger {
        self.log.with_channel("SandboxObject")
    }

    fn list(&self, category: Category) -> &Vec<SandboxObject> {
        match category {
            Category::Block => &self.blocks,
            Category::Prop => &self.props,
            Category::Enemy => &self.enemies,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<SandboxObject> {
        match category {
            Category::Block => &mut self.blocks,
            Category::Prop => &mut self.props,
            Category::Enemy => &mut self.enemies,
        }
    }
}
