//! Staff records and the level → default permission table. Permissions are
//! stored only; no route consults them.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{create, fetch, fetch_all, remove, save};
use crate::db::{
    models::{Staff, StaffLevel, StaffStatus},
    DocumentStore,
};
use crate::error::{AppError, AppResult};

pub const VIEW_DASHBOARD: &str = "view_dashboard";
pub const MANAGE_TEMPLATES: &str = "manage_templates";
pub const MANAGE_COMPONENTS: &str = "manage_components";
pub const MANAGE_BLOG: &str = "manage_blog";
pub const PUBLISH_BLOG: &str = "publish_blog";
pub const MANAGE_GALLERY: &str = "manage_gallery";
pub const MANAGE_STAFF: &str = "manage_staff";
pub const MANAGE_SETTINGS: &str = "manage_settings";

pub fn default_permissions(level: StaffLevel) -> &'static [&'static str] {
    match level {
        StaffLevel::SuperAdmin => &[
            VIEW_DASHBOARD,
            MANAGE_TEMPLATES,
            MANAGE_COMPONENTS,
            MANAGE_BLOG,
            PUBLISH_BLOG,
            MANAGE_GALLERY,
            MANAGE_STAFF,
            MANAGE_SETTINGS,
        ],
        StaffLevel::Admin => &[
            VIEW_DASHBOARD,
            MANAGE_TEMPLATES,
            MANAGE_COMPONENTS,
            MANAGE_BLOG,
            PUBLISH_BLOG,
            MANAGE_GALLERY,
            MANAGE_STAFF,
        ],
        StaffLevel::Editor => &[
            VIEW_DASHBOARD,
            MANAGE_TEMPLATES,
            MANAGE_COMPONENTS,
            MANAGE_BLOG,
            MANAGE_GALLERY,
        ],
        StaffLevel::Viewer => &[VIEW_DASHBOARD],
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPermissions {
    pub level: StaffLevel,
    pub permissions: Vec<&'static str>,
}

pub fn permission_table() -> Vec<LevelPermissions> {
    [
        StaffLevel::SuperAdmin,
        StaffLevel::Admin,
        StaffLevel::Editor,
        StaffLevel::Viewer,
    ]
    .into_iter()
    .map(|level| LevelPermissions {
        level,
        permissions: default_permissions(level).to_vec(),
    })
    .collect()
}

fn resolve_permissions(level: StaffLevel, requested: Option<Vec<String>>) -> Vec<String> {
    match requested {
        Some(list) => {
            let mut out: Vec<String> = Vec::new();
            for p in list.into_iter().map(|p| p.trim().to_string()) {
                if !p.is_empty() && !out.contains(&p) {
                    out.push(p);
                }
            }
            out
        }
        None => default_permissions(level)
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub level: StaffLevel,
    pub permissions: Option<Vec<String>>,
    pub status: Option<StaffStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub level: Option<StaffLevel>,
    pub permissions: Option<Vec<String>>,
    pub status: Option<StaffStatus>,
}

fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }
    Ok(())
}

pub async fn list_staff(store: &DocumentStore) -> AppResult<Vec<Staff>> {
    let mut staff: Vec<Staff> = fetch_all(store).await?;
    staff.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(staff)
}

pub async fn create_staff(store: &DocumentStore, input: StaffInput) -> AppResult<Staff> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let email = input.email.trim().to_lowercase();
    validate_email(&email)?;

    ensure_email_free(store, &email, None).await?;

    let now = Utc::now();
    let staff = Staff {
        id: String::new(),
        name: name.to_string(),
        email,
        level: input.level,
        permissions: resolve_permissions(input.level, input.permissions),
        status: input.status.unwrap_or_default(),
        created_at: Some(now),
        updated_at: Some(now),
    };
    Ok(create(store, staff).await?)
}

async fn ensure_email_free(store: &DocumentStore, email: &str, except_id: Option<&str>) -> AppResult<()> {
    let existing: Vec<Staff> = fetch_all(store).await?;
    let taken = existing
        .iter()
        .any(|s| s.email.eq_ignore_ascii_case(email) && Some(s.id.as_str()) != except_id);
    if taken {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    Ok(())
}

/// Changing the level without explicit permissions resets them to the
/// level's defaults.
pub async fn update_staff(store: &DocumentStore, id: &str, patch: StaffPatch) -> AppResult<Staff> {
    let mut staff: Staff = fetch(store, id).await?.ok_or(AppError::NotFound("Staff member"))?;

    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        staff.name = name.to_string();
    }
    if let Some(email) = patch.email {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        ensure_email_free(store, &email, Some(id)).await?;
        staff.email = email;
    }
    match (patch.level, patch.permissions) {
        (Some(level), permissions) => {
            staff.level = level;
            staff.permissions = resolve_permissions(level, permissions);
        }
        (None, Some(permissions)) => {
            staff.permissions = resolve_permissions(staff.level, Some(permissions));
        }
        (None, None) => {}
    }
    if let Some(status) = patch.status {
        staff.status = status;
    }
    staff.updated_at = Some(Utc::now());

    if !save(store, &staff).await? {
        return Err(AppError::NotFound("Staff member"));
    }
    Ok(staff)
}

pub async fn delete_staff(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<Staff>(store, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Staff member"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str, level: StaffLevel) -> StaffInput {
        StaffInput {
            name: name.to_string(),
            email: email.to_string(),
            level,
            permissions: None,
            status: None,
        }
    }

    #[test]
    fn test_permission_table_is_nested() {
        let table = permission_table();
        assert_eq!(table.len(), 4);
        for pair in table.windows(2) {
            assert!(pair[1]
                .permissions
                .iter()
                .all(|p| pair[0].permissions.contains(p)));
        }
    }

    #[tokio::test]
    async fn test_create_uses_level_defaults() {
        let store = DocumentStore::memory();
        let staff = create_staff(&store, input("Ana", "Ana@Example.com", StaffLevel::Editor))
            .await
            .unwrap();
        assert_eq!(staff.email, "ana@example.com");
        assert_eq!(staff.permissions.len(), default_permissions(StaffLevel::Editor).len());
        assert_eq!(staff.status, StaffStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_invalid_email() {
        let store = DocumentStore::memory();
        create_staff(&store, input("Ana", "ana@example.com", StaffLevel::Admin))
            .await
            .unwrap();
        assert!(matches!(
            create_staff(&store, input("Ana 2", "ANA@example.com", StaffLevel::Viewer)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            create_staff(&store, input("Bob", "not-an-email", StaffLevel::Viewer)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_level_change_resets_permissions() {
        let store = DocumentStore::memory();
        let mut custom = input("Cy", "cy@example.com", StaffLevel::Viewer);
        custom.permissions = Some(vec!["manage_blog".to_string(), "manage_blog".to_string()]);
        let staff = create_staff(&store, custom).await.unwrap();
        assert_eq!(staff.permissions, vec!["manage_blog"]);

        let promoted = update_staff(
            &store,
            &staff.id,
            StaffPatch {
                level: Some(StaffLevel::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(promoted.level, StaffLevel::Admin);
        assert!(promoted.permissions.iter().any(|p| p == MANAGE_STAFF));

        delete_staff(&store, &staff.id).await.unwrap();
        assert!(list_staff(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_email_of_another_member() {
        let store = DocumentStore::memory();
        let a = create_staff(&store, input("A", "a@x.com", StaffLevel::Editor))
            .await
            .unwrap();
        create_staff(&store, input("B", "b@x.com", StaffLevel::Editor))
            .await
            .unwrap();

        let result = update_staff(
            &store,
            &a.id,
            StaffPatch {
                email: Some("B@x.com".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // keeping one's own address is fine
        let same = update_staff(
            &store,
            &a.id,
            StaffPatch {
                email: Some("a@x.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(same.email, "a@x.com");

        let mut emails: Vec<String> = list_staff(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.email)
            .collect();
        emails.sort();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }
}
