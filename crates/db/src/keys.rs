//! Content-store keys.

/// Text assets: object with one array per category.
pub const ASSETS_BY_CATEGORY: &str = "assets-by-category";

/// Image collection: array of image records.
pub const IMAGE_COLLECTION: &str = "image-collection";

/// Drag-drop selections awaiting confirmation.
pub const PENDING_IMPORT_STAGING: &str = "pending-import-staging";

/// Compression and quota settings of the image manager.
pub const IMAGE_MANAGER_CONFIG: &str = "image-manager-config";
