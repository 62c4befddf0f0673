/// Asset and image identifiers. Text assets use synthesized
/// timestamp-based ids, images use a local counter; the spaces are disjoint.
pub type AssetId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
