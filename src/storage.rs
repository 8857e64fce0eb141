//! Storage helpers for uploaded image content on disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of some content.
pub fn compute_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Pick a file extension from the content's magic bytes.
///
/// Falls back to `bin`; images are stored as-is, never validated.
pub fn detect_extension(content: &[u8]) -> &'static str {
    infer::get(content)
        .map(|kind| kind.extension())
        .unwrap_or("bin")
}

/// Construct the image reference (relative path) for some content.
///
/// Uses a two-level directory structure based on hash prefix for filesystem efficiency:
/// `{hash[0..2]}/{hash[0..16]}.{extension}`
pub fn image_ref(content_hash: &str, extension: &str) -> String {
    format!("{}/{}.{}", &content_hash[..2], &content_hash[..16], extension)
}

/// Resolve an image reference to a path under `images_dir`.
///
/// Returns `None` for references that would escape the directory.
pub fn resolve_image_path(images_dir: &Path, image_ref: &str) -> Option<PathBuf> {
    if image_ref.is_empty()
        || image_ref.starts_with('/')
        || image_ref.starts_with('\\')
        || image_ref.split(|c: char| c == '/' || c == '\\').any(|part| part == "..")
    {
        return None;
    }
    Some(images_dir.join(image_ref))
}

/// Write image content to disk and return its image reference.
///
/// Identical content maps to the same file, so re-uploads share storage.
pub async fn save_image_file(images_dir: &Path, content: &[u8]) -> std::io::Result<String> {
    let reference = image_ref(&compute_hash(content), detect_extension(content));
    let path = images_dir.join(&reference);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, content).await?;

    Ok(reference)
}

/// Read image content back by reference.
pub async fn read_image_file(images_dir: &Path, image_ref: &str) -> std::io::Result<Vec<u8>> {
    let path = resolve_image_path(images_dir, image_ref).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid image reference '{}'", image_ref),
        )
    })?;
    tokio::fs::read(path).await
}
