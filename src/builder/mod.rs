//! Component-tree editing for the page builder.
//!
//! A template owns an ordered list of components. Drag-and-drop inserts
//! bundles or single components at a drop index, drags within the canvas
//! re-order, and the property panel replaces a component by id. There is no
//! undo log and no conflict detection; the caller persists the result.

pub mod slug;

use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};

use crate::db::models::TemplateComponent;

pub use slug::{is_valid_slug, slugify};

const ID_SUFFIX_LEN: usize = 9;

/// `{type}-{unix millis}-{random suffix}`. Not checked against existing ids.
pub fn generate_component_id(kind: &str) -> String {
    let kind = if kind.trim().is_empty() {
        "component"
    } else {
        kind.trim()
    };
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), ID_SUFFIX_LEN)
        .to_lowercase();
    format!("{}-{}-{}", kind, Utc::now().timestamp_millis(), suffix)
}

fn assign_fresh_ids(component: &mut TemplateComponent) {
    component.id = generate_component_id(&component.kind);
    for child in &mut component.children {
        assign_fresh_ids(child);
    }
}

/// Fill in a missing type (`text`) and id on every component in the tree.
/// Existing ids are kept.
pub fn normalize_components(components: Vec<TemplateComponent>) -> Vec<TemplateComponent> {
    components
        .into_iter()
        .map(|mut c| {
            if c.kind.trim().is_empty() {
                c.kind = "text".to_string();
            }
            if c.id.trim().is_empty() {
                c.id = generate_component_id(&c.kind);
            }
            c.children = normalize_components(c.children);
            c
        })
        .collect()
}

/// What was dragged onto the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum DragPayload {
    /// A full component bundle carried inline
    Bundle { components: Vec<TemplateComponent> },
    /// One component
    Component { component: TemplateComponent },
    /// A library bundle referenced by id, resolved by the caller
    Library {
        #[serde(rename = "componentId")]
        component_id: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("index {index} is out of range for {len} components")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Editing state for one template's component list
#[derive(Debug, Clone, Default)]
pub struct TemplateEditor {
    components: Vec<TemplateComponent>,
    selected: Option<String>,
}

impl TemplateEditor {
    pub fn new(components: Vec<TemplateComponent>) -> Self {
        Self {
            components,
            selected: None,
        }
    }

    pub fn components(&self) -> &[TemplateComponent] {
        &self.components
    }

    pub fn into_components(self) -> Vec<TemplateComponent> {
        self.components
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&TemplateComponent> {
        let id = self.selected.as_deref()?;
        find(&self.components, id)
    }

    /// Select a component; returns false (and keeps the old selection) when
    /// no component has that id.
    pub fn select(&mut self, id: &str) -> bool {
        if find(&self.components, id).is_some() {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Insert `items` at `index` (clamped to the list length) in order,
    /// giving each item and its children fresh ids. Returns the new
    /// top-level ids.
    pub fn insert_at(&mut self, index: usize, items: Vec<TemplateComponent>) -> Vec<String> {
        let index = index.min(self.components.len());
        let mut ids = Vec::with_capacity(items.len());

        let fresh: Vec<TemplateComponent> = items
            .into_iter()
            .map(|mut item| {
                assign_fresh_ids(&mut item);
                ids.push(item.id.clone());
                item
            })
            .collect();

        self.components.splice(index..index, fresh);
        ids
    }

    /// Remove the first component with `id`, top level first, then nested.
    /// Clears the selection when it pointed at the removed component.
    pub fn remove(&mut self, id: &str) -> Option<TemplateComponent> {
        let removed = remove_from(&mut self.components, id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(removed)
    }

    /// Replace the component with the same id, leaving order untouched.
    pub fn update(&mut self, component: TemplateComponent) -> bool {
        match find_mut(&mut self.components, &component.id) {
            Some(slot) => {
                *slot = component;
                true
            }
            None => false,
        }
    }

    /// Move a top-level component; `to` is clamped to the last position.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        let len = self.components.len();
        if from >= len {
            return Err(BuilderError::IndexOutOfRange { index: from, len });
        }
        let item = self.components.remove(from);
        let to = to.min(self.components.len());
        self.components.insert(to, item);
        Ok(())
    }
}

fn find<'a>(list: &'a [TemplateComponent], id: &str) -> Option<&'a TemplateComponent> {
    for component in list {
        if component.id == id {
            return Some(component);
        }
        if let Some(found) = find(&component.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut<'a>(list: &'a mut [TemplateComponent], id: &str) -> Option<&'a mut TemplateComponent> {
    for component in list.iter_mut() {
        if component.id == id {
            return Some(component);
        }
        if let Some(found) = find_mut(&mut component.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(list: &mut Vec<TemplateComponent>, id: &str) -> Option<TemplateComponent> {
    if let Some(pos) = list.iter().position(|c| c.id == id) {
        return Some(list.remove(pos));
    }
    list.iter_mut()
        .find_map(|component| remove_from(&mut component.children, id))
}
