use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;
use warp_intents_types::{Action, Warp};

use crate::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../templates/catalog.json");

/// A named template: a Warp whose inputs are not yet bound
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateEntry {
    pub id: String,
    pub warp: Warp,
}

impl TemplateEntry {
    pub fn actions(&self) -> &[Action] {
        &self.warp.actions
    }
}

#[derive(Deserialize)]
struct CatalogDocument {
    templates: Vec<TemplateEntry>,
}

/// Immutable lookup of templates by intent identifier
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// after construction.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
    index: HashMap<String, usize>,
}

impl TemplateCatalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let catalog = Self::from_entries(document.templates)?;
        debug!(templates = catalog.len(), "loaded template catalog");
        Ok(catalog)
    }

    pub fn from_entries(entries: Vec<TemplateEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            entry
                .warp
                .validate()
                .map_err(|source| CatalogError::InvalidTemplate {
                    id: entry.id.clone(),
                    source,
                })?;
            if index.insert(entry.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateTemplate(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Add the templates of another catalog; identifiers must not collide
    pub fn merge(mut self, other: TemplateCatalog) -> Result<Self, CatalogError> {
        for entry in other.entries {
            if self.index.contains_key(&entry.id) {
                return Err(CatalogError::DuplicateTemplate(entry.id));
            }
            self.index.insert(entry.id.clone(), self.entries.len());
            self.entries.push(entry);
        }
        Ok(self)
    }

    pub fn get_template(&self, intent_id: &str) -> Result<&TemplateEntry, CatalogError> {
        self.index
            .get(intent_id)
            .map(|idx| &self.entries[*idx])
            .ok_or_else(|| CatalogError::UnsupportedIntent(intent_id.to_string()))
    }

    /// Ordered action definitions of a template
    pub fn actions(&self, intent_id: &str) -> Result<&[Action], CatalogError> {
        self.get_template(intent_id).map(TemplateEntry::actions)
    }

    pub fn contains(&self, intent_id: &str) -> bool {
        self.index.contains_key(intent_id)
    }

    /// Identifiers in catalog order
    pub fn intent_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
