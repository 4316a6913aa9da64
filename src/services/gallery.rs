use chrono::Utc;

use super::{create, fetch, fetch_all, remove};
use crate::db::{models::GalleryImage, DocumentStore};
use crate::error::{AppError, AppResult};

pub async fn list_images(store: &DocumentStore) -> AppResult<Vec<GalleryImage>> {
    let mut images: Vec<GalleryImage> = fetch_all(store).await?;
    // ties keep newest-inserted first
    images.reverse();
    images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(images)
}

pub async fn get_image(store: &DocumentStore, id: &str) -> AppResult<Option<GalleryImage>> {
    Ok(fetch(store, id).await?)
}

pub async fn record_image(
    store: &DocumentStore,
    name: &str,
    image_url: &str,
    storage_path: &str,
) -> AppResult<GalleryImage> {
    let image = GalleryImage {
        id: String::new(),
        image_url: image_url.to_string(),
        name: name.to_string(),
        storage_path: storage_path.to_string(),
        created_at: Some(Utc::now()),
    };
    Ok(create(store, image).await?)
}

pub async fn delete_image_record(store: &DocumentStore, id: &str) -> AppResult<()> {
    if remove::<GalleryImage>(store, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Image"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_list_delete() {
        let store = DocumentStore::memory();
        let first = record_image(&store, "a.png", "http://x/a", "gallery/a.png")
            .await
            .unwrap();
        let second = record_image(&store, "b.png", "http://x/b", "gallery/b.png")
            .await
            .unwrap();

        let images = list_images(&store).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, second.id);

        delete_image_record(&store, &first.id).await.unwrap();
        assert!(get_image(&store, &first.id).await.unwrap().is_none());
        assert!(matches!(
            delete_image_record(&store, &first.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
