//! Filename and MIME type rules for reference uploads and stored outputs.

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Lowercased extension after the last `.`, if it is an accepted image type.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// MIME type for an upload, or `None` when the filename is not an accepted
/// image.
pub fn mime_for_filename(filename: &str) -> Option<String> {
    allowed_extension(filename).map(|ext| match ext.as_str() {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{}", other),
    })
}

/// File extension used when persisting an image of the given MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => {
            tracing::warn!("Unrecognized image MIME type '{}', storing as .bin", other);
            "bin"
        }
    }
}
