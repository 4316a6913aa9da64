//! Component library: named bundles dragged from the builder sidebar.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{create, fetch, fetch_all, find_one_by, remove, save, seed_missing};
use crate::builder::{generate_component_id, is_valid_slug, normalize_components, slugify};
use crate::db::{
    models::{ComponentEditor, TemplateComponent},
    DocumentStore,
};
use crate::error::{AppError, AppResult};

fn props_for(kind: &str, props: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(kind.to_string(), props);
    map
}

fn seed_bundle(name: &str, description: &str, kind: &str, props: Value) -> ComponentEditor {
    ComponentEditor {
        name: name.to_string(),
        slug: slugify(name),
        description: description.to_string(),
        components: vec![TemplateComponent {
            id: generate_component_id(kind),
            kind: kind.to_string(),
            name: name.to_string(),
            props: props_for(kind, props),
            children: Vec::new(),
        }],
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
        ..Default::default()
    }
}

/// One library entry per built-in component type
pub fn seed_components() -> Vec<ComponentEditor> {
    vec![
        seed_bundle(
            "Hero",
            "Headline, subheading and call to action",
            "hero",
            json!({
                "title": "Build something people want",
                "subtitle": "Launch a landing page in minutes",
                "buttonText": "Get started",
                "buttonLink": "#",
                "backgroundImage": ""
            }),
        ),
        seed_bundle(
            "Text",
            "Rich text block",
            "text",
            json!({ "content": "<p>Write something here.</p>", "align": "left" }),
        ),
        seed_bundle(
            "Button",
            "Single call-to-action button",
            "button",
            json!({ "label": "Click me", "link": "#", "variant": "primary" }),
        ),
        seed_bundle(
            "Image",
            "Responsive image with caption",
            "image",
            json!({ "src": "", "alt": "", "caption": "" }),
        ),
        seed_bundle(
            "Grid",
            "Multi-column layout container",
            "grid",
            json!({ "columns": 3, "gap": 16 }),
        ),
        seed_bundle(
            "Features",
            "Feature list with icons",
            "features",
            json!({
                "title": "Features",
                "items": [
                    { "icon": "zap", "title": "Fast", "description": "Loads in a blink" },
                    { "icon": "shield", "title": "Secure", "description": "Safe by default" },
                    { "icon": "smile", "title": "Simple", "description": "No learning curve" }
                ]
            }),
        ),
        seed_bundle(
            "Testimonials",
            "Customer quotes",
            "testimonials",
            json!({ "title": "What customers say", "items": [] }),
        ),
        seed_bundle(
            "Pricing",
            "Pricing plans table",
            "pricing",
            json!({ "title": "Pricing", "plans": [] }),
        ),
        seed_bundle(
            "Contact Form",
            "Name, email and message form",
            "form",
            json!({ "fields": ["name", "email", "message"], "submitText": "Send" }),
        ),
        seed_bundle(
            "Footer",
            "Links and copyright line",
            "footer",
            json!({ "copyright": "", "links": [] }),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBundleInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBundlePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub components: Option<Vec<TemplateComponent>>,
}

pub async fn ensure_default_components(store: &DocumentStore) -> AppResult<usize> {
    Ok(seed_missing(store, seed_components(), |c| c.name.as_str()).await?)
}

pub async fn list_bundles(store: &DocumentStore) -> AppResult<Vec<ComponentEditor>> {
    ensure_default_components(store).await?;
    Ok(fetch_all(store).await?)
}

pub async fn get_bundle(store: &DocumentStore, id: &str) -> AppResult<ComponentEditor> {
    fetch(store, id)
        .await?
        .ok_or(AppError::NotFound("Component"))
}

fn resolve_slug(name: &str, requested: Option<String>) -> AppResult<String> {
    let slug = match requested.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => s,
        _ => slugify(name),
    };
    if !is_valid_slug(&slug) {
        return Err(AppError::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(slug)
}

async fn ensure_slug_free(store: &DocumentStore, slug: &str, except_id: Option<&str>) -> AppResult<()> {
    let existing: Option<ComponentEditor> = find_one_by(store, "slug", slug).await?;
    match existing {
        Some(other) if Some(other.id.as_str()) != except_id => {
            Err(AppError::Conflict("Slug already exists".to_string()))
        }
        _ => Ok(()),
    }
}

pub async fn create_bundle(store: &DocumentStore, input: ComponentBundleInput) -> AppResult<ComponentEditor> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let slug = resolve_slug(name, input.slug)?;
    ensure_slug_free(store, &slug, None).await?;

    let now = Utc::now();
    let bundle = ComponentEditor {
        id: String::new(),
        name: name.to_string(),
        slug,
        description: input.description.trim().to_string(),
        thumbnail: input.thumbnail.filter(|t| !t.trim().is_empty()),
        components: normalize_components(input.components),
        created_at: Some(now),
        updated_at: Some(now),
    };
    Ok(create(store, bundle).await?)
}

pub async fn update_bundle(
    store: &DocumentStore,
    id: &str,
    patch: ComponentBundlePatch,
) -> AppResult<ComponentEditor> {
    let mut bundle = get_bundle(store, id).await?;

    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        bundle.name = name.to_string();
    }
    if let Some(slug) = patch.slug {
        let slug = resolve_slug(&bundle.name, Some(slug))?;
        ensure_slug_free(store, &slug, Some(id)).await?;
        bundle.slug = slug;
    }
    if let Some(description) = patch.description {
        bundle.description = description.trim().to_string();
    }
    if let Some(thumbnail) = patch.thumbnail {
        bundle.thumbnail = Some(thumbnail).filter(|t| !t.trim().is_empty());
    }
    if let Some(components) = patch.components {
        bundle.components = normalize_components(components);
    }
    bundle.updated_at = Some(Utc::now());

    if !save(store, &bundle).await? {
        return Err(AppError::NotFound("Component"));
    }
    Ok(bundle)
}

pub async fn delete_bundle(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<ComponentEditor>(store, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Component"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ComponentBundleInput {
        ComponentBundleInput {
            name: name.to_string(),
            slug: None,
            description: String::new(),
            thumbnail: None,
            components: vec![TemplateComponent {
                kind: "hero".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_seed_names_are_unique() {
        let seeds = seed_components();
        let mut names: Vec<_> = seeds.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), seeds.len());
        assert!(seeds.iter().all(|s| s.components.len() == 1));
    }

    #[tokio::test]
    async fn test_list_seeds_once() {
        let store = DocumentStore::memory();
        let first = list_bundles(&store).await.unwrap();
        let second = list_bundles(&store).await.unwrap();
        assert_eq!(first.len(), seed_components().len());
        assert_eq!(second.len(), first.len());
    }

    #[tokio::test]
    async fn test_create_normalizes_components() {
        let store = DocumentStore::memory();
        let bundle = create_bundle(&store, input("Split Hero")).await.unwrap();
        assert_eq!(bundle.slug, "split-hero");
        assert!(bundle.components[0].id.starts_with("hero-"));

        let fetched = get_bundle(&store, &bundle.id).await.unwrap();
        assert_eq!(fetched, bundle);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = DocumentStore::memory();
        create_bundle(&store, input("Split Hero")).await.unwrap();
        let err = create_bundle(&store, input("Split  Hero!")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected() {
        let store = DocumentStore::memory();
        let mut bad = input("Card");
        bad.slug = Some("Not A Slug".to_string());
        let err = create_bundle(&store, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = DocumentStore::memory();
        let bundle = create_bundle(&store, input("Card")).await.unwrap();

        let updated = update_bundle(
            &store,
            &bundle.id,
            ComponentBundlePatch {
                description: Some("A card".to_string()),
                components: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.description, "A card");
        assert!(updated.components.is_empty());

        delete_bundle(&store, &bundle.id).await.unwrap();
        assert!(matches!(
            get_bundle(&store, &bundle.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
