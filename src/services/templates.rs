use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{components, create, fetch, fetch_all, find_one_by, remove, save};
use crate::builder::{is_valid_slug, normalize_components, slugify, DragPayload, TemplateEditor};
use crate::db::{
    models::{Template, TemplateComponent},
    DocumentStore,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub components: Option<Vec<TemplateComponent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    #[serde(default)]
    pub index: Option<usize>,
    pub payload: DragPayload,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

/// Template after a drop, with the ids given to the inserted components
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropResult {
    pub template: Template,
    pub inserted_ids: Vec<String>,
}

pub async fn list_templates(store: &DocumentStore, category_id: Option<&str>) -> AppResult<Vec<Template>> {
    let mut templates: Vec<Template> = fetch_all(store).await?;
    if let Some(category_id) = category_id {
        templates.retain(|t| t.category_id.as_deref() == Some(category_id));
    }
    templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(templates)
}

pub async fn get_template(store: &DocumentStore, id: &str) -> AppResult<Template> {
    fetch(store, id).await?.ok_or(AppError::NotFound("Template"))
}

fn resolve_slug(name: &str, requested: Option<String>) -> AppResult<String> {
    let slug = match requested.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => s,
        _ => slugify(name),
    };
    if slug.is_empty() || !is_valid_slug(&slug) {
        return Err(AppError::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(slug)
}

async fn ensure_slug_free(store: &DocumentStore, slug: &str, except_id: Option<&str>) -> AppResult<()> {
    let existing: Option<Template> = find_one_by(store, "slug", slug).await?;
    match existing {
        Some(other) if Some(other.id.as_str()) != except_id => {
            Err(AppError::Conflict("Slug already exists".to_string()))
        }
        _ => Ok(()),
    }
}

/// New templates start with no components
pub async fn create_template(store: &DocumentStore, input: TemplateInput) -> AppResult<Template> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let slug = resolve_slug(name, input.slug)?;
    ensure_slug_free(store, &slug, None).await?;

    let now = Utc::now();
    let template = Template {
        id: String::new(),
        name: name.to_string(),
        slug,
        description: input.description.trim().to_string(),
        category_id: input.category_id.filter(|c| !c.trim().is_empty()),
        components: Vec::new(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let template = create(store, template).await?;
    tracing::info!(template_id = %template.id, slug = %template.slug, "template created");
    Ok(template)
}

async fn persist(store: &DocumentStore, mut template: Template) -> AppResult<Template> {
    template.updated_at = Some(Utc::now());
    if !save(store, &template).await? {
        return Err(AppError::NotFound("Template"));
    }
    Ok(template)
}

pub async fn update_template(store: &DocumentStore, id: &str, patch: TemplatePatch) -> AppResult<Template> {
    let mut template = get_template(store, id).await?;

    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        template.name = name.to_string();
    }
    if let Some(slug) = patch.slug {
        let slug = resolve_slug(&template.name, Some(slug))?;
        ensure_slug_free(store, &slug, Some(id)).await?;
        template.slug = slug;
    }
    if let Some(description) = patch.description {
        template.description = description.trim().to_string();
    }
    if let Some(category_id) = patch.category_id {
        template.category_id = Some(category_id).filter(|c| !c.trim().is_empty());
    }
    if let Some(components) = patch.components {
        template.components = normalize_components(components);
    }

    persist(store, template).await
}

pub async fn delete_template(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<Template>(store, id).await? {
        tracing::info!(template_id = %id, "template deleted");
        Ok(())
    } else {
        Err(AppError::NotFound("Template"))
    }
}

/// Insert a dragged payload at the drop index (end of list when absent)
pub async fn drop_components(store: &DocumentStore, id: &str, request: DropRequest) -> AppResult<DropResult> {
    let template = get_template(store, id).await?;

    let items = match request.payload {
        DragPayload::Bundle { components } => components,
        DragPayload::Component { component } => vec![component],
        DragPayload::Library { component_id } => {
            components::get_bundle(store, &component_id).await?.components
        }
    };
    if items.is_empty() {
        return Err(AppError::validation("Dropped payload contains no components"));
    }

    let mut editor = TemplateEditor::new(template.components.clone());
    let index = request.index.unwrap_or(editor.components().len());
    let inserted_ids = editor.insert_at(index, items);

    let template = persist(
        store,
        Template {
            components: editor.into_components(),
            ..template
        },
    )
    .await?;

    Ok(DropResult {
        template,
        inserted_ids,
    })
}

pub async fn move_component(store: &DocumentStore, id: &str, request: MoveRequest) -> AppResult<Template> {
    let mut template = get_template(store, id).await?;
    let mut editor = TemplateEditor::new(std::mem::take(&mut template.components));
    editor
        .move_item(request.from, request.to)
        .map_err(|e| AppError::validation(e.to_string()))?;
    template.components = editor.into_components();
    persist(store, template).await
}

/// Replace one component's properties; its id comes from the path
pub async fn update_component(
    store: &DocumentStore,
    id: &str,
    component_id: &str,
    mut component: TemplateComponent,
) -> AppResult<Template> {
    let mut template = get_template(store, id).await?;
    component.id = component_id.to_string();

    let mut editor = TemplateEditor::new(std::mem::take(&mut template.components));
    if !editor.update(component) {
        return Err(AppError::NotFound("Component"));
    }
    template.components = editor.into_components();
    persist(store, template).await
}

pub async fn delete_component(store: &DocumentStore, id: &str, component_id: &str) -> AppResult<Template> {
    let mut template = get_template(store, id).await?;

    let mut editor = TemplateEditor::new(std::mem::take(&mut template.components));
    if editor.remove(component_id).is_none() {
        return Err(AppError::NotFound("Component"));
    }
    template.components = editor.into_components();
    persist(store, template).await
}
