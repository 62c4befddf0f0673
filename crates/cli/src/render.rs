//! Plain-text formatting for terminal output.

use hoard_core::asset::Asset;
use hoard_core::diff::{LineStatus, RenderedLine};
use hoard_core::image::{ImageAsset, ImageStats};
use hoard_core::library::LibraryStats;
use hoard_core::staging::StagedFile;
use hoard_events::{Notice, NoticeLevel};
use hoard_pipeline::engine::{CommitSummary, Presentation, Verification};
use hoard_pipeline::image_pipeline::ImageImportReport;

pub fn asset_row(asset: &Asset) -> String {
    format!(
        "{:>15}  {:<10}  {} {}  ({} B, {} segments)",
        asset.id,
        asset.category.as_str(),
        if asset.favorite { "*" } else { " " },
        asset.name,
        asset.size,
        asset.code_segments,
    )
}

pub fn image_row(image: &ImageAsset) -> String {
    format!(
        "{:>6}  {} {}  {}x{}  ({} B{})",
        image.id,
        if image.favorite { "*" } else { " " },
        image.name,
        image.width,
        image.height,
        image.size,
        if image.compressed_data.is_some() { ", compressed" } else { "" },
    )
}

pub fn staged_row(file: &StagedFile) -> String {
    format!(
        "{:>4}  {:<10}  {}  ({} B){}",
        file.id,
        file.selected_category.as_str(),
        file.name,
        file.size,
        if file.read_error { "  [unreadable]" } else { "" },
    )
}

pub fn library_stats(stats: &LibraryStats) -> String {
    let mut out = format!(
        "{} file(s), {} B, {} favorite(s)",
        stats.total_files, stats.total_size, stats.favorites
    );
    for category in &stats.by_category {
        out.push_str(&format!(
            "\n  {:<10} {:>5} file(s) {:>10} B",
            category.category.as_str(),
            category.count,
            category.size
        ));
    }
    out
}

pub fn image_stats(stats: &ImageStats, limit: u64) -> String {
    format!(
        "{} image(s), {} B stored of {} B, {} favorite(s)",
        stats.total_images, stats.total_size, limit, stats.favorites
    )
}

fn marker(status: LineStatus) -> char {
    match status {
        LineStatus::Added => '+',
        LineStatus::Removed => '-',
        LineStatus::Unchanged => ' ',
    }
}

fn side(lines: &[RenderedLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{:>4} {} {}", l.number, marker(l.status), l.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The wizard screen for one candidate.
pub fn presentation(p: &Presentation<'_>) -> String {
    let candidate = p.candidate;
    let mut out = format!(
        "Duplicate {} of {} ({} left): {}\n",
        p.index + 1,
        p.total,
        p.remaining,
        candidate.imported.name
    );
    if candidate.is_content_same {
        out.push_str("Content is identical.\n");
    }
    if p.diff.too_large {
        out.push_str("Too large to compare line by line; changes are not marked.\n");
    }
    out.push_str(&format!(
        "--- local ({}, {} B)\n{}\n+++ imported ({} B)\n{}",
        candidate.local_asset.category.as_str(),
        candidate.local_asset.size,
        side(&p.diff.local),
        candidate.imported.size,
        side(&p.diff.imported),
    ));
    out
}

pub fn commit_summary(summary: &CommitSummary) -> String {
    let mut out = format!(
        "Imported {} file(s) ({} added as new), replaced {}, skipped {}",
        summary.total_imported, summary.added_as_new_count, summary.replaced_count, summary.skipped_count
    );
    if summary.implicitly_skipped > 0 {
        out.push_str(&format!(" ({} left unresolved)", summary.implicitly_skipped));
    }
    if let Verification::Mismatch { expected, actual, .. } = summary.verification {
        out.push_str(&format!("\nWarning: expected {expected} new file(s), found {actual}"));
    }
    out
}

pub fn image_report(report: &ImageImportReport) -> Option<String> {
    if report.is_empty() {
        return None;
    }
    let mut out = format!("Imported {} image(s)", report.imported.len());
    for (name, reason) in &report.rejected {
        out.push_str(&format!("\n  skipped {name}: {reason}"));
    }
    Some(out)
}

pub fn notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hoard_core::asset::ReadFile;
    use hoard_core::category::Category;
    use hoard_core::diff::side_by_side;
    use hoard_core::duplicate::DuplicateCandidate;

    #[test]
    fn asset_row_marks_favorites() {
        let mut asset = Asset::from_read_file(
            &ReadFile::new("potion.txt", "text/plain", "heal 10"),
            42,
            Category::Items,
            Utc::now(),
        );
        asset.favorite = true;
        let row = asset_row(&asset);
        assert!(row.contains("* potion.txt"));
        assert!(row.contains("items"));
    }

    #[test]
    fn presentation_shows_both_sides() {
        let local = Asset::from_read_file(
            &ReadFile::new("potion.txt", "", "heal 10"),
            1,
            Category::Items,
            Utc::now(),
        );
        let candidate = DuplicateCandidate::new(local, ReadFile::new("potion.txt", "", "heal 20"));
        let p = Presentation {
            index: 0,
            total: 2,
            remaining: 2,
            candidate: &candidate,
            diff: side_by_side("heal 10", "heal 20"),
        };
        let screen = presentation(&p);
        assert!(screen.starts_with("Duplicate 1 of 2"));
        assert!(screen.contains("   1 - heal 10"));
        assert!(screen.contains("   1 + heal 20"));
    }

    #[test]
    fn notice_levels() {
        assert_eq!(notice(&Notice::warning("x", "careful")), "[warn] careful");
    }
}
