use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{create, fetch, fetch_all, find_one_by, remove, save};
use crate::builder::{is_valid_slug, slugify};
use crate::db::{
    models::{Author, BlogPost, BlogStatus},
    DocumentStore,
};
use crate::error::{AppError, AppResult};

/// Sanitize HTML content using ammonia
fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
            out.push(value);
        }
    }
    out
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub status: Option<BlogStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    10
}

impl Default for BlogListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            status: None,
            category: None,
            tag: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogPost>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub featured_image: Option<String>,
    #[serde(default)]
    pub author: Author,
    pub status: Option<BlogStatus>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<Author>,
    pub status: Option<BlogStatus>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

fn resolve_slug(title: &str, requested: Option<String>) -> AppResult<String> {
    let slug = match requested.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => s,
        _ => slugify(title),
    };
    if !is_valid_slug(&slug) {
        return Err(AppError::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(slug)
}

async fn ensure_slug_free(store: &DocumentStore, slug: &str, except_id: Option<&str>) -> AppResult<()> {
    let existing: Option<BlogPost> = find_one_by(store, "slug", slug).await?;
    match existing {
        Some(other) if Some(other.id.as_str()) != except_id => {
            Err(AppError::Conflict("Slug already exists".to_string()))
        }
        _ => Ok(()),
    }
}

fn apply_status(post: &mut BlogPost, status: BlogStatus) {
    if status == BlogStatus::Published && post.published_at.is_none() {
        post.published_at = Some(Utc::now());
    }
    post.status = status;
}

/// Newest first, filtered and paginated (page size clamped to 1..=100)
pub async fn list_posts(store: &DocumentStore, query: BlogListQuery) -> AppResult<BlogListResponse> {
    let mut posts: Vec<BlogPost> = fetch_all(store).await?;

    if let Some(status) = query.status {
        posts.retain(|p| p.status == status);
    }
    if let Some(category) = query.category.as_deref() {
        posts.retain(|p| p.categories.iter().any(|c| c.eq_ignore_ascii_case(category)));
    }
    if let Some(tag) = query.tag.as_deref() {
        posts.retain(|p| p.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)));
    }
    posts.reverse();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page_size = query.page_size.clamp(1, 100);
    let page = query.page.max(1);
    let total = posts.len();
    let items = posts
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Ok(BlogListResponse {
        items,
        page,
        page_size,
        total,
    })
}

pub async fn get_post(store: &DocumentStore, id: &str) -> AppResult<BlogPost> {
    fetch(store, id).await?.ok_or(AppError::NotFound("Blog post"))
}

pub async fn get_post_by_slug(store: &DocumentStore, slug: &str) -> AppResult<BlogPost> {
    if !is_valid_slug(slug) {
        return Err(AppError::validation("Invalid slug"));
    }
    find_one_by(store, "slug", slug)
        .await?
        .ok_or(AppError::NotFound("Blog post"))
}

pub async fn create_post(store: &DocumentStore, payload: CreateBlogRequest) -> AppResult<BlogPost> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    let slug = resolve_slug(title, payload.slug)?;
    ensure_slug_free(store, &slug, None).await?;

    let now = Utc::now();
    let mut post = BlogPost {
        title: title.to_string(),
        slug,
        content: sanitize_html(&payload.content),
        excerpt: payload.excerpt.trim().to_string(),
        featured_image: payload.featured_image.filter(|u| !u.trim().is_empty()),
        author: payload.author,
        categories: clean_list(payload.categories),
        tags: clean_list(payload.tags),
        created_at: Some(now),
        updated_at: Some(now),
        ..Default::default()
    };
    apply_status(&mut post, payload.status.unwrap_or_default());

    let post = create(store, post).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post created");
    Ok(post)
}

pub async fn update_post(store: &DocumentStore, id: &str, payload: UpdateBlogRequest) -> AppResult<BlogPost> {
    let mut post = get_post(store, id).await?;

    if let Some(title) = payload.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        post.title = title.to_string();
    }
    if let Some(slug) = payload.slug {
        let slug = resolve_slug(&post.title, Some(slug))?;
        ensure_slug_free(store, &slug, Some(id)).await?;
        post.slug = slug;
    }
    if let Some(content) = payload.content {
        post.content = sanitize_html(&content);
    }
    if let Some(excerpt) = payload.excerpt {
        post.excerpt = excerpt.trim().to_string();
    }
    if let Some(image) = payload.featured_image {
        post.featured_image = Some(image).filter(|u| !u.trim().is_empty());
    }
    if let Some(author) = payload.author {
        post.author = author;
    }
    if let Some(categories) = payload.categories {
        post.categories = clean_list(categories);
    }
    if let Some(tags) = payload.tags {
        post.tags = clean_list(tags);
    }
    if let Some(status) = payload.status {
        apply_status(&mut post, status);
    }
    post.updated_at = Some(Utc::now());

    if !save(store, &post).await? {
        return Err(AppError::NotFound("Blog post"));
    }
    Ok(post)
}

pub async fn delete_post(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<BlogPost>(store, id).await? {
        tracing::info!(post_id = %id, "blog post deleted");
        Ok(())
    } else {
        Err(AppError::NotFound("Blog post"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> CreateBlogRequest {
        CreateBlogRequest {
            title: title.to_string(),
            slug: None,
            content: "<p>Hello</p><script>alert(1)</script>".to_string(),
            excerpt: String::new(),
            featured_image: None,
            author: Author::default(),
            status: None,
            categories: vec!["Design".to_string(), " design ".to_string()],
            tags: vec!["ux".to_string(), "".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_defaults() {
        let store = DocumentStore::memory();
        let post = create_post(&store, request("Hello World")).await.unwrap();
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.status, BlogStatus::Draft);
        assert!(!post.content.contains("<script>"));
        assert!(post.content.contains("<p>Hello</p>"));
        assert_eq!(post.categories, vec!["Design"]);
        assert_eq!(post.tags, vec!["ux"]);
        assert_eq!((post.views, post.likes, post.comments), (0, 0, 0));
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = DocumentStore::memory();
        create_post(&store, request("Hello World")).await.unwrap();
        let err = create_post(&store, request("hello world")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_publishing_sets_published_at_once() {
        let store = DocumentStore::memory();
        let post = create_post(&store, request("Publish me")).await.unwrap();

        let published = update_post(
            &store,
            &post.id,
            UpdateBlogRequest {
                status: Some(BlogStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let first = published.published_at.unwrap();

        let archived = update_post(
            &store,
            &post.id,
            UpdateBlogRequest {
                status: Some(BlogStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(archived.status, BlogStatus::Archived);

        let republished = update_post(
            &store,
            &post.id,
            UpdateBlogRequest {
                status: Some(BlogStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(republished.published_at.unwrap(), first);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = DocumentStore::memory();
        for i in 0..5 {
            let mut req = request(&format!("Post {}", i));
            if i % 2 == 0 {
                req.status = Some(BlogStatus::Published);
                req.tags = vec!["even".to_string()];
            }
            create_post(&store, req).await.unwrap();
        }

        let published = list_posts(
            &store,
            BlogListQuery {
                status: Some(BlogStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(published.total, 3);

        let tagged = list_posts(
            &store,
            BlogListQuery {
                tag: Some("EVEN".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(tagged.total, 3);

        let page = list_posts(
            &store,
            BlogListQuery {
                page: 2,
                page_size: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let store = DocumentStore::memory();
        let post = create_post(&store, request("Find me")).await.unwrap();
        assert_eq!(get_post_by_slug(&store, "find-me").await.unwrap().id, post.id);
        assert!(matches!(
            get_post_by_slug(&store, "Bad Slug").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            get_post_by_slug(&store, "missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
