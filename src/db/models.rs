//! Persisted entities. Every field defaults so partial records decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collections;

/// A typed record living in one collection of the document store
pub trait Entity: Default {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! impl_entity {
    ($ty:ty, $collection:expr) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

/// One building block on a template canvas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Property bag keyed by component type, e.g. `props.hero.title`
    pub props: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category_id: Option<String>,
    pub components: Vec<TemplateComponent>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl_entity!(Template, collections::TEMPLATES);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl_entity!(TemplateCategory, collections::TEMPLATE_CATEGORIES);

/// A named bundle of components offered in the builder's library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentEditor {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub components: Vec<TemplateComponent>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl_entity!(ComponentEditor, collections::COMPONENT_EDITORS);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Sanitized HTML
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub author: Author,
    pub status: BlogStatus,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl_entity!(BlogPost, collections::BLOGS);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryImage {
    pub id: String,
    pub image_url: String,
    pub name: String,
    pub storage_path: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl_entity!(GalleryImage, collections::GALLERY);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StaffLevel {
    SuperAdmin,
    Admin,
    Editor,
    #[default]
    Viewer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub level: StaffLevel,
    pub permissions: Vec<String>,
    pub status: StaffStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl_entity!(Staff, collections::STAFF);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_type_field_is_named_type() {
        let component: TemplateComponent = serde_json::from_value(json!({
            "id": "hero-1",
            "type": "hero",
            "props": { "hero": { "title": "Welcome" } }
        }))
        .unwrap();
        assert_eq!(component.kind, "hero");
        assert_eq!(component.props["hero"]["title"], "Welcome");
        assert!(component.children.is_empty());

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["type"], "hero");
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_blog_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BlogStatus::Published).unwrap(),
            json!("published")
        );
        assert_eq!(BlogStatus::default(), BlogStatus::Draft);
    }

    #[test]
    fn test_staff_level_camel_case() {
        let level: StaffLevel = serde_json::from_value(json!("superAdmin")).unwrap();
        assert_eq!(level, StaffLevel::SuperAdmin);
    }
}
