//! The category-to-assets mapping for the text-asset world.
//!
//! [`CategorizedAssets`] is the in-memory shape of the `assets-by-category`
//! record: exactly five arrays, one per [`Category`]. Lookups by name walk
//! the categories in [`Category::ALL`] order and each array front to back,
//! so the first match is deterministic for a given snapshot.

use serde::{Deserialize, Serialize};

use crate::asset::{code_segments_for, Asset, ReadFile};
use crate::category::Category;
use crate::error::CoreError;
use crate::types::{AssetId, Timestamp};

/// Assets partitioned into the five fixed categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedAssets {
    pub items: Vec<Asset>,
    pub skills: Vec<Asset>,
    pub characters: Vec<Asset>,
    pub talents: Vec<Asset>,
    pub others: Vec<Asset>,
}

/// Per-category array lengths, captured before a commit for rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint([usize; 5]);

/// Counters for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub size: u64,
    pub favorites: usize,
}

/// Library-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_files: usize,
    pub total_size: u64,
    pub by_category: Vec<CategoryStats>,
    pub favorites: usize,
}

impl CategorizedAssets {
    pub fn get(&self, category: Category) -> &Vec<Asset> {
        match category {
            Category::Items => &self.items,
            Category::Skills => &self.skills,
            Category::Characters => &self.characters,
            Category::Talents => &self.talents,
            Category::Others => &self.others,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut Vec<Asset> {
        match category {
            Category::Items => &mut self.items,
            Category::Skills => &mut self.skills,
            Category::Characters => &mut self.characters,
            Category::Talents => &mut self.talents,
            Category::Others => &mut self.others,
        }
    }

    /// All assets in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        Category::ALL.into_iter().flat_map(move |c| self.get(c).iter())
    }

    pub fn total_count(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// First asset whose name equals `name` exactly (case-sensitive).
    pub fn find_by_name_exact(&self, name: &str) -> Option<&Asset> {
        self.iter().find(|asset| asset.name == name)
    }

    pub fn find_by_id(&self, id: AssetId) -> Option<&Asset> {
        self.iter().find(|asset| asset.id == id)
    }

    fn position(&self, id: AssetId) -> Option<(Category, usize)> {
        Category::ALL.into_iter().find_map(|category| {
            self.get(category)
                .iter()
                .position(|asset| asset.id == id)
                .map(|index| (category, index))
        })
    }

    fn locate_mut(&mut self, id: AssetId) -> Result<&mut Asset, CoreError> {
        let (category, index) = self.position(id).ok_or(CoreError::NotFound {
            entity: "asset",
            id,
        })?;
        Ok(&mut self.get_mut(category)[index])
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Append an asset to the array of its own category.
    pub fn push(&mut self, asset: Asset) {
        self.get_mut(asset.category).push(asset);
    }

    /// Overwrite an existing asset's content in place.
    ///
    /// The record keeps its id, name, category and favorite flag; content,
    /// size, code segments and upload time come from the imported file.
    pub fn replace_content(
        &mut self,
        id: AssetId,
        imported: &ReadFile,
        now: Timestamp,
    ) -> Result<&Asset, CoreError> {
        let asset = self.locate_mut(id)?;
        asset.content = imported.content.clone();
        asset.size = imported.size;
        asset.code_segments = code_segments_for(&asset.name, &asset.content);
        asset.upload_time = now;
        Ok(asset)
    }

    pub fn remove(&mut self, id: AssetId) -> Result<Asset, CoreError> {
        let (category, index) = self.position(id).ok_or(CoreError::NotFound {
            entity: "asset",
            id,
        })?;
        Ok(self.get_mut(category).remove(index))
    }

    /// Move an asset to another category. Moving to its current category
    /// is a no-op.
    pub fn move_to(&mut self, id: AssetId, target: Category) -> Result<(), CoreError> {
        let (category, _) = self.position(id).ok_or(CoreError::NotFound {
            entity: "asset",
            id,
        })?;
        if category == target {
            return Ok(());
        }
        let mut asset = self.remove(id)?;
        asset.category = target;
        self.push(asset);
        Ok(())
    }

    /// Flip the favorite flag; returns the new value.
    pub fn toggle_favorite(&mut self, id: AssetId) -> Result<bool, CoreError> {
        let asset = self.locate_mut(id)?;
        asset.favorite = !asset.favorite;
        Ok(asset.favorite)
    }

    /// Rename an asset. The new name is trimmed and must not be empty.
    pub fn rename(&mut self, id: AssetId, new_name: &str) -> Result<(), CoreError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("File name must not be empty".into()));
        }
        let asset = self.locate_mut(id)?;
        asset.name = trimmed.to_string();
        asset.code_segments = code_segments_for(&asset.name, &asset.content);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ── Rollback ─────────────────────────────────────────────────────

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(Category::ALL.map(|c| self.get(c).len()))
    }

    /// Drop everything appended since `checkpoint`.
    ///
    /// Only valid when the arrays have been appended to, not reordered or
    /// shrunk, since the checkpoint was taken.
    pub fn truncate_to(&mut self, checkpoint: Checkpoint) {
        for (category, len) in Category::ALL.into_iter().zip(checkpoint.0) {
            self.get_mut(category).truncate(len);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Assets of one category, favorites first, otherwise in stored order.
    pub fn list(&self, category: Category) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self.get(category).iter().collect();
        assets.sort_by_key(|asset| !asset.favorite);
        assets
    }

    /// Case-insensitive substring search over names and contents.
    pub fn search(&self, query: &str) -> Vec<&Asset> {
        let needle = query.to_lowercase();
        self.iter()
            .filter(|asset| {
                asset.name.to_lowercase().contains(&needle)
                    || asset.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        let by_category: Vec<CategoryStats> = Category::ALL
            .into_iter()
            .map(|category| {
                let assets = self.get(category);
                CategoryStats {
                    category,
                    count: assets.len(),
                    size: assets.iter().map(|a| a.size).sum(),
                    favorites: assets.iter().filter(|a| a.favorite).count(),
                }
            })
            .collect();

        LibraryStats {
            total_files: by_category.iter().map(|s| s.count).sum(),
            total_size: by_category.iter().map(|s| s.size).sum(),
            favorites: by_category.iter().map(|s| s.favorites).sum(),
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn asset(id: AssetId, name: &str, content: &str, category: Category) -> Asset {
        let file = ReadFile::new(name, "text/plain", content);
        Asset::from_read_file(&file, id, category, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    fn sample() -> CategorizedAssets {
        let mut lib = CategorizedAssets::default();
        lib.push(asset(1, "potion.txt", "heal 10", Category::Items));
        lib.push(asset(2, "fireball.js", "cast fire", Category::Skills));
        lib.push(asset(3, "hero.md", "brave", Category::Characters));
        lib
    }

    // -- lookup --

    #[test]
    fn find_by_name_is_case_sensitive() {
        let lib = sample();
        assert_eq!(lib.find_by_name_exact("potion.txt").map(|a| a.id), Some(1));
        assert!(lib.find_by_name_exact("Potion.txt").is_none());
    }

    #[test]
    fn find_by_name_returns_first_in_category_order() {
        let mut lib = sample();
        lib.push(asset(10, "dup.txt", "b", Category::Others));
        lib.push(asset(11, "dup.txt", "a", Category::Items));
        lib.push(asset(12, "dup.txt", "c", Category::Items));
        assert_eq!(lib.find_by_name_exact("dup.txt").map(|a| a.id), Some(11));
    }

    // -- mutation --

    #[test]
    fn replace_content_keeps_identity() {
        let mut lib = sample();
        let later = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let imported = ReadFile::new("potion.txt", "text/plain", "heal 20");
        lib.replace_content(1, &imported, later).unwrap();

        let replaced = lib.find_by_id(1).unwrap();
        assert_eq!(replaced.content, "heal 20");
        assert_eq!(replaced.size, 7);
        assert_eq!(replaced.category, Category::Items);
        assert_eq!(replaced.upload_time, later);
        assert_eq!(lib.items.len(), 1);
    }

    #[test]
    fn replace_content_unknown_id_is_not_found() {
        let mut lib = sample();
        let imported = ReadFile::new("x", "", "y");
        assert!(matches!(
            lib.replace_content(99, &imported, Utc::now()),
            Err(CoreError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn move_to_changes_category() {
        let mut lib = sample();
        lib.move_to(1, Category::Others).unwrap();
        assert!(lib.items.is_empty());
        assert_eq!(lib.others[0].category, Category::Others);
    }

    #[test]
    fn toggle_favorite_and_list_favorites_first() {
        let mut lib = sample();
        lib.push(asset(4, "elixir.txt", "mana", Category::Items));
        assert!(lib.toggle_favorite(4).unwrap());
        let ids: Vec<AssetId> = lib.list(Category::Items).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![4, 1]);
        assert!(!lib.toggle_favorite(4).unwrap());
    }

    #[test]
    fn rename_trims_and_rejects_empty() {
        let mut lib = sample();
        lib.rename(1, "  tonic.txt ").unwrap();
        assert_eq!(lib.find_by_id(1).unwrap().name, "tonic.txt");
        assert!(lib.rename(1, "   ").is_err());
    }

    #[test]
    fn truncate_to_restores_pre_append_state() {
        let mut lib = sample();
        let before = lib.clone();
        let checkpoint = lib.checkpoint();
        lib.push(asset(20, "a.txt", "a", Category::Items));
        lib.push(asset(21, "b.txt", "b", Category::Talents));
        lib.truncate_to(checkpoint);
        assert_eq!(lib, before);
    }

    // -- queries --

    #[test]
    fn search_matches_name_or_content_case_insensitively() {
        let lib = sample();
        let hits: Vec<AssetId> = lib.search("FIRE").iter().map(|a| a.id).collect();
        assert_eq!(hits, vec![2]);
        let hits: Vec<AssetId> = lib.search("Brave").iter().map(|a| a.id).collect();
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn stats_aggregate_per_category() {
        let mut lib = sample();
        lib.toggle_favorite(2).unwrap();
        let stats = lib.stats();
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size, 7 + 9 + 5);
        assert_eq!(stats.favorites, 1);
        assert_eq!(stats.by_category[1].category, Category::Skills);
        assert_eq!(stats.by_category[1].favorites, 1);
    }

    #[test]
    fn clear_empties_everything() {
        let mut lib = sample();
        lib.clear();
        assert!(lib.is_empty());
    }
}
