use serde::Deserialize;

use super::{create, fetch, fetch_all, remove, save, seed_missing};
use crate::db::{models::TemplateCategory, DocumentStore};
use crate::error::{AppError, AppResult};

const SEED_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Landing Pages", "Single-page layouts built to convert visitors", "layout"),
    ("Business", "Company sites, services and agencies", "briefcase"),
    ("Portfolio", "Showcase work, projects and case studies", "image"),
    ("E-commerce", "Product launches and online stores", "shopping-cart"),
    ("Blog", "Articles, magazines and newsletters", "file-text"),
    ("Events", "Conferences, meetups and webinars", "calendar"),
    ("SaaS", "Software products and pricing pages", "cloud"),
    ("Personal", "Resumes, bios and link pages", "user"),
];

pub fn seed_categories() -> Vec<TemplateCategory> {
    SEED_CATEGORIES
        .iter()
        .map(|(name, description, icon)| TemplateCategory {
            id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

pub async fn ensure_default_categories(store: &DocumentStore) -> AppResult<usize> {
    Ok(seed_missing(store, seed_categories(), |c| c.name.as_str()).await?)
}

/// All categories, seeding the defaults first
pub async fn list_categories(store: &DocumentStore) -> AppResult<Vec<TemplateCategory>> {
    ensure_default_categories(store).await?;
    let mut categories: Vec<TemplateCategory> = fetch_all(store).await?;
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(categories)
}

async fn name_taken(store: &DocumentStore, name: &str, except_id: Option<&str>) -> AppResult<bool> {
    let existing: Vec<TemplateCategory> = fetch_all(store).await?;
    Ok(existing.iter().any(|c| {
        c.name.trim().eq_ignore_ascii_case(name.trim()) && Some(c.id.as_str()) != except_id
    }))
}

pub async fn create_category(store: &DocumentStore, input: CategoryInput) -> AppResult<TemplateCategory> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if name_taken(store, name, None).await? {
        return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
    }

    let category = TemplateCategory {
        id: String::new(),
        name: name.to_string(),
        description: input.description.trim().to_string(),
        icon: input.icon.trim().to_string(),
    };
    Ok(create(store, category).await?)
}

pub async fn update_category(
    store: &DocumentStore,
    id: &str,
    patch: CategoryPatch,
) -> AppResult<TemplateCategory> {
    let mut category: TemplateCategory = fetch(store, id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        if name_taken(store, name, Some(id)).await? {
            return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
        }
        category.name = name.to_string();
    }
    if let Some(description) = patch.description {
        category.description = description.trim().to_string();
    }
    if let Some(icon) = patch.icon {
        category.icon = icon.trim().to_string();
    }

    if !save(store, &category).await? {
        return Err(AppError::NotFound("Category"));
    }
    Ok(category)
}

pub async fn delete_category(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<TemplateCategory>(store, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Category"))
    }
}
