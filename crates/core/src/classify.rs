//! File classification: image vs. everything else, and code files.
//!
//! Some hosts omit the MIME type, so image detection checks both the
//! `image/` MIME prefix and a filename extension allow-list.

// ── Constants ────────────────────────────────────────────────────────

/// Image file extensions (lowercase, with dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".tiff", ".tif", ".ico", ".heic",
    ".heif", ".avif", ".jfif",
];

/// Extensions whose content gets code-segment counting.
pub const CODE_EXTENSIONS: &[&str] = &[
    ".js", ".java", ".py", ".c", ".cpp", ".h", ".html", ".css", ".php", ".json", ".xml", ".sql",
    ".ts", ".jsx", ".tsx", ".vue", ".rb", ".go", ".rs", ".sh", ".bat", ".ps1", ".md", ".yaml",
    ".yml", ".toml", ".ini", ".cfg", ".conf",
];

/// MIME prefix shared by all image types.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Image types stored as-is, with unknown dimensions, when they cannot be
/// decoded locally.
pub const UNDECODED_IMAGE_MIMES: &[&str] = &["image/svg+xml", "image/heic", "image/heif", "image/avif"];

// ── Classification ───────────────────────────────────────────────────

/// Whether a file should go to the image pipeline.
pub fn is_image_file(name: &str, mime_type: &str) -> bool {
    if mime_type.to_lowercase().starts_with(IMAGE_MIME_PREFIX) {
        return true;
    }
    has_extension(name, IMAGE_EXTENSIONS)
}

/// Whether an image of this type is kept even when decoding fails.
pub fn accepts_undecoded(mime_type: &str) -> bool {
    let mime = mime_type.to_lowercase();
    UNDECODED_IMAGE_MIMES.contains(&mime.as_str())
}

/// Vector images are never re-encoded.
pub fn is_vector_image(mime_type: &str) -> bool {
    mime_type.to_lowercase().starts_with("image/svg")
}

/// Whether a file name carries a recognised code extension (case-insensitive).
pub fn is_code_file(name: &str) -> bool {
    !name.is_empty() && has_extension(name, CODE_EXTENSIONS)
}

/// Best-effort MIME type for an image file name, used when the host
/// reported none.
pub fn infer_image_mime(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext)?;
    let mime = match ext {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- is_image_file --

    #[test]
    fn image_by_mime() {
        assert!(is_image_file("blob", "image/png"));
        assert!(is_image_file("photo", "IMAGE/JPEG"));
    }

    #[test]
    fn image_by_extension_when_mime_missing() {
        assert!(is_image_file("Portrait.PNG", ""));
        assert!(is_image_file("scan.jfif", "application/octet-stream"));
    }

    #[test]
    fn text_is_not_image() {
        assert!(!is_image_file("potion.txt", "text/plain"));
        assert!(!is_image_file("png.txt", ""));
    }

    // -- is_code_file --

    #[test]
    fn code_extensions_match_case_insensitively() {
        assert!(is_code_file("main.RS"));
        assert!(is_code_file("config.yaml"));
        assert!(!is_code_file("notes.txt"));
        assert!(!is_code_file(""));
    }

    // -- infer_image_mime --

    #[test]
    fn infer_known_extensions() {
        assert_eq!(infer_image_mime("a.JPG"), Some("image/jpeg"));
        assert_eq!(infer_image_mime("b.webp"), Some("image/webp"));
        assert_eq!(infer_image_mime("c.txt"), None);
        assert_eq!(infer_image_mime("noext"), None);
    }

    // -- undecoded images --

    #[test]
    fn formats_without_a_local_decoder_are_accepted() {
        assert!(accepts_undecoded("image/svg+xml"));
        assert!(accepts_undecoded("IMAGE/HEIC"));
        assert!(accepts_undecoded(infer_image_mime("shot.avif").unwrap()));
        assert!(!accepts_undecoded("image/png"));
    }

    #[test]
    fn only_svg_is_vector() {
        assert!(is_vector_image("image/svg+xml"));
        assert!(!is_vector_image("image/tiff"));
    }
}
