//! Duplicate detection for an import batch.
//!
//! A freshly-read file is a duplicate when an existing asset in any
//! category has exactly the same name. Partitioning is a pure function of
//! the batch and a library snapshot.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, ReadFile};
use crate::category::Category;
use crate::content::is_content_exactly_same;
use crate::library::CategorizedAssets;

/// What the user decided for one duplicate candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Keep the local asset, drop the imported file.
    Skip,
    /// Keep both; the imported file is committed as a new asset.
    #[serde(rename = "add")]
    AddAsNew,
    /// Overwrite the local asset's content with the imported file.
    Replace,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::AddAsNew => "add",
            Self::Replace => "replace",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Skip => "Skip",
            Self::AddAsNew => "Add as new",
            Self::Replace => "Replace",
        }
    }
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pairing of an existing asset with an imported file of the same name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCandidate {
    pub local_asset: Asset,
    pub imported: ReadFile,
    pub is_content_same: bool,
    pub selected_category: Category,
    pub processed: bool,
    pub action: Option<ResolutionAction>,
}

impl DuplicateCandidate {
    pub fn new(local_asset: Asset, imported: ReadFile) -> Self {
        let is_content_same =
            is_content_exactly_same(Some(&local_asset.content), Some(&imported.content));
        let selected_category = imported.selected_category.unwrap_or(local_asset.category);
        Self {
            local_asset,
            imported,
            is_content_same,
            selected_category,
            processed: false,
            action: None,
        }
    }

    /// Record a resolution. Returns `false` if the candidate was already
    /// processed, leaving it untouched.
    pub fn resolve(&mut self, action: ResolutionAction) -> bool {
        if self.processed {
            return false;
        }
        self.processed = true;
        self.action = Some(action);
        true
    }
}

/// A batch split into name collisions and new files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportPartition {
    pub duplicates: Vec<DuplicateCandidate>,
    pub uniques: Vec<ReadFile>,
}

impl ImportPartition {
    pub fn len(&self) -> usize {
        self.duplicates.len() + self.uniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Partition `batch` against `library` without mutating either.
///
/// Input order is preserved within each side. When the library holds
/// several assets with the colliding name, the first one in category order
/// then array order is the `local_asset`.
pub fn detect_duplicates(batch: &[ReadFile], library: &CategorizedAssets) -> ImportPartition {
    let mut partition = ImportPartition::default();

    for file in batch {
        match library.find_by_name_exact(&file.name) {
            Some(existing) => partition
                .duplicates
                .push(DuplicateCandidate::new(existing.clone(), file.clone())),
            None => partition.uniques.push(file.clone()),
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn library_with(entries: &[(i64, &str, &str, Category)]) -> CategorizedAssets {
        let mut lib = CategorizedAssets::default();
        for (id, name, content, category) in entries {
            let file = ReadFile::new(*name, "text/plain", *content);
            lib.push(Asset::from_read_file(&file, *id, *category, Utc::now()));
        }
        lib
    }

    // -- detect_duplicates --

    #[test]
    fn partition_covers_whole_batch() {
        let lib = library_with(&[(1, "potion.txt", "heal 10", Category::Items)]);
        let batch = vec![
            ReadFile::new("potion.txt", "text/plain", "heal 20"),
            ReadFile::new("sword.txt", "text/plain", "slash"),
            ReadFile::new("shield.txt", "text/plain", "block"),
        ];
        let partition = detect_duplicates(&batch, &lib);
        assert_eq!(partition.duplicates.len() + partition.uniques.len(), batch.len());
        assert_eq!(partition.duplicates.len(), 1);
        assert_eq!(partition.uniques[0].name, "sword.txt");
        assert_eq!(partition.uniques[1].name, "shield.txt");
    }

    #[test]
    fn partition_is_deterministic_and_pure() {
        let lib = library_with(&[
            (1, "a.txt", "x", Category::Items),
            (2, "b.txt", "y", Category::Talents),
        ]);
        let snapshot = lib.clone();
        let batch = vec![
            ReadFile::new("b.txt", "", "y"),
            ReadFile::new("c.txt", "", "z"),
            ReadFile::new("a.txt", "", "x "),
        ];
        let first = detect_duplicates(&batch, &lib);
        let second = detect_duplicates(&batch, &lib);
        assert_eq!(first, second);
        assert_eq!(lib, snapshot);
    }

    #[test]
    fn lookup_is_global_across_categories() {
        let lib = library_with(&[(5, "hero.md", "brave", Category::Characters)]);
        let batch = vec![ReadFile::new("hero.md", "", "brave").with_category(Category::Items)];
        let partition = detect_duplicates(&batch, &lib);
        assert_eq!(partition.duplicates.len(), 1);
        assert_eq!(partition.duplicates[0].local_asset.id, 5);
        assert_eq!(partition.duplicates[0].selected_category, Category::Items);
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let lib = library_with(&[(1, "Potion.txt", "heal", Category::Items)]);
        let partition = detect_duplicates(&[ReadFile::new("potion.txt", "", "heal")], &lib);
        assert!(partition.duplicates.is_empty());
    }

    #[test]
    fn duplicate_of_duplicate_uses_first_found() {
        let lib = library_with(&[
            (30, "potion.txt", "third", Category::Talents),
            (10, "potion.txt", "first", Category::Items),
            (20, "potion.txt", "second", Category::Items),
        ]);
        let partition = detect_duplicates(&[ReadFile::new("potion.txt", "", "new")], &lib);
        assert_eq!(partition.duplicates[0].local_asset.id, 10);
    }

    // -- content equality --

    #[test]
    fn content_same_requires_exact_match() {
        let lib = library_with(&[(1, "potion.txt", "heal 10", Category::Items)]);
        let same = detect_duplicates(&[ReadFile::new("potion.txt", "", "heal 10")], &lib);
        let trailing = detect_duplicates(&[ReadFile::new("potion.txt", "", "heal 10 ")], &lib);
        assert!(same.duplicates[0].is_content_same);
        assert!(!trailing.duplicates[0].is_content_same);
    }

    #[test]
    fn selected_category_defaults_to_local_category() {
        let lib = library_with(&[(1, "spell.js", "x", Category::Skills)]);
        let partition = detect_duplicates(&[ReadFile::new("spell.js", "", "y")], &lib);
        assert_eq!(partition.duplicates[0].selected_category, Category::Skills);
    }

    // -- resolve --

    #[test]
    fn resolve_only_once() {
        let lib = library_with(&[(1, "a.txt", "x", Category::Items)]);
        let mut candidate = detect_duplicates(&[ReadFile::new("a.txt", "", "y")], &lib)
            .duplicates
            .remove(0);
        assert!(candidate.resolve(ResolutionAction::Replace));
        assert!(!candidate.resolve(ResolutionAction::Skip));
        assert_eq!(candidate.action, Some(ResolutionAction::Replace));
    }

    #[test]
    fn action_serializes_with_short_names() {
        assert_eq!(serde_json::to_string(&ResolutionAction::AddAsNew).unwrap(), "\"add\"");
        assert_eq!(ResolutionAction::Skip.to_string(), "skip");
    }
}
