//! Rules for files sent to object storage.

use uuid::Uuid;

use crate::validation::ValidationError;

/// Bucket for team logos and player avatars
pub const MEDIA_BUCKET: &str = "media";

/// Bucket for images attached to feed posts
pub const POST_IMAGES_BUCKET: &str = "post-images";

/// Largest accepted upload (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// File extension for an accepted image content type
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

pub fn check_image(content_type: &str, size: usize) -> Result<(), ValidationError> {
    if image_extension(content_type).is_none() {
        return Err(ValidationError::new(
            "file",
            format!("unsupported image type '{}'", content_type),
        ));
    }
    if size == 0 {
        return Err(ValidationError::new("file", "is empty"));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::new("file", "must be 5 MB or smaller"));
    }
    Ok(())
}

/// Unique object path, e.g. `teams/<team id>/<random>.png`
pub fn object_path(folder: &str, owner: Uuid, content_type: &str) -> Option<String> {
    let ext = image_extension(content_type)?;
    Some(format!("{}/{}/{}.{}", folder, owner, Uuid::new_v4(), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_image() {
        assert!(check_image("image/png", 1024).is_ok());
        assert!(check_image("IMAGE/JPEG", 1024).is_ok());
        assert!(check_image("application/pdf", 1024).is_err());
        assert!(check_image("image/png", 0).is_err());
        assert!(check_image("image/png", MAX_IMAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_object_path() {
        let owner = Uuid::nil();
        let path = object_path("teams", owner, "image/webp").unwrap();
        assert!(path.starts_with("teams/00000000-0000-0000-0000-000000000000/"));
        assert!(path.ends_with(".webp"));
        assert!(object_path("teams", owner, "text/plain").is_none());
    }
}
