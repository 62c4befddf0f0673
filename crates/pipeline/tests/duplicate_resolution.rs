mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use hoard_core::category::Category;
use hoard_core::duplicate::ResolutionAction;
use hoard_db::StoreError;
use hoard_pipeline::engine::{Step, Verification};
use hoard_pipeline::{ImportError, ImportResult, TextOutcome};

use common::Harness;

async fn potion_collision(h: &mut Harness) -> ImportResult {
    h.seed(1, "potion.txt", "heal 10", Category::Items).await;
    let handle = h.text("potion.txt", "heal 20");
    h.orchestrator
        .handle_file_picker(&mut h.repos, vec![handle], Category::Items)
        .await
        .unwrap()
}

fn committed(step: Step) -> hoard_pipeline::CommitSummary {
    match step {
        Step::Committed(summary) => summary,
        other => panic!("expected a commit, got {other:?}"),
    }
}

// -- scenarios --

#[tokio::test]
async fn replace_overwrites_local_content() {
    let mut h = Harness::new().await;
    let result = potion_collision(&mut h).await;
    assert_matches!(
        result,
        ImportResult::Processed(report) if report.text == TextOutcome::AwaitingResolution { duplicates: 1, uniques: 0 }
    );

    let presented = h.orchestrator.presentation().unwrap();
    assert!(!presented.candidate.is_content_same);
    assert_eq!(presented.total, 1);

    let before = Utc::now();
    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::Replace)
            .await
            .unwrap(),
    );

    let potions = h.assets_named("potion.txt");
    assert_eq!(potions.len(), 1);
    assert_eq!(potions[0].content, "heal 20");
    assert_eq!(potions[0].category, Category::Items);
    assert!(potions[0].upload_time >= before);
    assert_eq!(summary.replaced_files, vec!["potion.txt".to_string()]);
    assert_eq!(summary.total_imported, 0);
    assert_eq!(summary.verification, Verification::Verified);
}

#[tokio::test]
async fn add_as_new_keeps_both_copies() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;

    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::AddAsNew)
            .await
            .unwrap(),
    );

    let potions = h.assets_named("potion.txt");
    assert_eq!(potions.len(), 2);
    assert_ne!(potions[0].id, potions[1].id);
    assert_eq!(h.repos.assets.library().total_count(), 2);
    assert_eq!(summary.total_imported, 1);
    assert_eq!(summary.added_as_new_count, 1);
}

#[tokio::test]
async fn skip_leaves_repository_unchanged() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;
    let before = h.repos.assets.library().clone();

    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::Skip)
            .await
            .unwrap(),
    );

    assert_eq!(h.repos.assets.library(), &before);
    assert_eq!(summary.skipped_files, vec!["potion.txt".to_string()]);
    assert_eq!(summary.total_imported, 0);
}

#[tokio::test]
async fn batch_without_collisions_commits_directly() {
    let mut h = Harness::new().await;
    h.seed(1, "existing.txt", "x", Category::Items).await;
    let handles = vec![
        h.text("a.txt", "alpha"),
        h.text("b.md", "# beta"),
        h.text("c.js", "function c() {}"),
    ];

    let result = h
        .orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Skills)
        .await
        .unwrap();

    let ImportResult::Processed(report) = result else {
        panic!("picker was debounced");
    };
    let summary = assert_matches!(report.text, TextOutcome::Committed(summary) => summary);
    assert_eq!(summary.total_imported, 3);
    assert_eq!(summary.verification, Verification::Verified);
    assert!(!h.orchestrator.is_resolving());
    assert_eq!(h.repos.assets.library().skills.len(), 3);
}

#[tokio::test]
async fn images_bypass_the_wizard_in_a_mixed_batch() {
    let mut h = Harness::new().await;
    h.seed(1, "potion.txt", "heal 10", Category::Items).await;
    let handles = vec![
        h.image("a.png", b"png-a"),
        h.text("potion.txt", "heal 20"),
        h.image("b.png", b"png-b"),
    ];

    let result = h
        .orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Items)
        .await
        .unwrap();

    let ImportResult::Processed(report) = result else {
        panic!("picker was debounced");
    };
    assert_eq!(report.images.imported_count(), 2);
    assert_eq!(h.repos.images.images().len(), 2);
    assert_eq!(
        report.text,
        TextOutcome::AwaitingResolution {
            duplicates: 1,
            uniques: 0
        }
    );

    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::AddAsNew)
            .await
            .unwrap(),
    );
    assert_eq!(summary.total_imported, 1);
    assert_eq!(h.repos.images.images().len(), 2);
}

// -- wizard --

#[tokio::test]
async fn duplicates_and_uniques_commit_together() {
    let mut h = Harness::new().await;
    h.seed(1, "a.txt", "old a", Category::Items).await;
    h.seed(2, "b.txt", "old b", Category::Talents).await;
    let handles = vec![
        h.text("a.txt", "new a"),
        h.text("fresh.txt", "fresh"),
        h.text("b.txt", "old b"),
    ];

    h.orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Others)
        .await
        .unwrap();
    assert_eq!(h.orchestrator.candidates().len(), 2);
    assert!(h.orchestrator.candidates()[1].is_content_same);

    // Uniques wait for the last decision.
    assert!(h.assets_named("fresh.txt").is_empty());

    let step = h
        .orchestrator
        .resolve(&mut h.repos, ResolutionAction::AddAsNew)
        .await
        .unwrap();
    assert_eq!(step, Step::Next(1));

    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::Skip)
            .await
            .unwrap(),
    );
    assert_eq!(summary.total_imported, 2);
    assert_eq!(summary.skipped_files, vec!["b.txt".to_string()]);
    assert_eq!(h.assets_named("fresh.txt")[0].category, Category::Others);
    assert_eq!(h.assets_named("a.txt").len(), 2);
    assert_eq!(h.repos.assets.library().total_count(), 4);
}

#[tokio::test]
async fn select_jumps_to_another_candidate() {
    let mut h = Harness::new().await;
    h.seed(1, "a.txt", "a", Category::Items).await;
    h.seed(2, "b.txt", "b", Category::Items).await;
    let handles = vec![h.text("a.txt", "a2"), h.text("b.txt", "b2")];
    h.orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Items)
        .await
        .unwrap();

    h.orchestrator.select(1).unwrap();
    assert_eq!(h.orchestrator.presentation().unwrap().candidate.imported.name, "b.txt");

    // Resolving b wraps back to a.
    let step = h
        .orchestrator
        .resolve(&mut h.repos, ResolutionAction::Skip)
        .await
        .unwrap();
    assert_eq!(step, Step::Next(0));
}

#[tokio::test]
async fn cancel_skips_the_rest_and_commits() {
    let mut h = Harness::new().await;
    h.seed(1, "a.txt", "a", Category::Items).await;
    h.seed(2, "b.txt", "b", Category::Items).await;
    let handles = vec![
        h.text("a.txt", "a2"),
        h.text("b.txt", "b2"),
        h.text("c.txt", "c"),
    ];
    h.orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Items)
        .await
        .unwrap();

    h.orchestrator
        .resolve(&mut h.repos, ResolutionAction::AddAsNew)
        .await
        .unwrap();
    let summary = h.orchestrator.cancel_resolution(&mut h.repos).await.unwrap();

    assert_eq!(summary.implicitly_skipped, 1);
    assert_eq!(summary.skipped_files, vec!["b.txt".to_string()]);
    assert_eq!(summary.total_imported, 2);
    assert!(!h.orchestrator.is_resolving());
}

#[tokio::test]
async fn second_batch_is_refused_while_resolving() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;

    let other = h.text("other.txt", "x");
    let err = h
        .orchestrator
        .handle_file_picker(&mut h.repos, vec![other], Category::Items)
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::ResolutionInProgress);

    let err = h.orchestrator.confirm_staged_import(&mut h.repos).await.unwrap_err();
    assert_matches!(err, ImportError::ResolutionInProgress);
}

#[tokio::test]
async fn resolve_without_session_is_an_error() {
    let mut h = Harness::new().await;
    let err = h
        .orchestrator
        .resolve(&mut h.repos, ResolutionAction::Skip)
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::NoActiveSession);
}

// -- failure handling --

#[tokio::test]
async fn failed_commit_rolls_back_and_can_be_retried() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;
    let before = h.repos.assets.library().clone();

    h.store.fail_writes(true);
    let err = h
        .orchestrator
        .resolve(&mut h.repos, ResolutionAction::AddAsNew)
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::Store(StoreError::WriteRejected(_)));
    assert_eq!(h.repos.assets.library(), &before);
    assert!(h.orchestrator.is_resolving());
    assert!(h.sink.event_types().contains(&"import.commit_failed".to_string()));

    h.store.fail_writes(false);
    let summary = h.orchestrator.retry_commit(&mut h.repos).await.unwrap();
    assert_eq!(summary.total_imported, 1);
    assert_eq!(h.assets_named("potion.txt").len(), 2);
    assert!(!h.orchestrator.is_resolving());
}

#[tokio::test]
async fn failed_replace_leaves_candidate_unresolved() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;

    h.store.fail_writes(true);
    assert!(h
        .orchestrator
        .resolve(&mut h.repos, ResolutionAction::Replace)
        .await
        .is_err());
    assert_eq!(h.assets_named("potion.txt")[0].content, "heal 10");
    assert!(!h.orchestrator.candidates()[0].processed);

    h.store.fail_writes(false);
    h.orchestrator
        .resolve(&mut h.repos, ResolutionAction::Replace)
        .await
        .unwrap();
    assert_eq!(h.assets_named("potion.txt")[0].content, "heal 20");
}

#[tokio::test]
async fn discard_drops_the_session() {
    let mut h = Harness::new().await;
    potion_collision(&mut h).await;
    h.orchestrator
        .resolve(&mut h.repos, ResolutionAction::Skip)
        .await
        .unwrap();
    assert!(!h.orchestrator.is_resolving());
    assert_eq!(h.orchestrator.discard_resolution(), None);

    let again = h.text("potion.txt", "heal 30");
    h.orchestrator
        .handle_file_picker(&mut h.repos, vec![again], Category::Items)
        .await
        .unwrap();
    h.store.fail_writes(true);
    h.orchestrator
        .resolve(&mut h.repos, ResolutionAction::AddAsNew)
        .await
        .unwrap_err();
    assert_eq!(h.orchestrator.discard_resolution(), Some(1));
    assert!(!h.orchestrator.is_resolving());
}

#[tokio::test]
async fn count_mismatch_reloads_from_storage() {
    let mut h = Harness::new().await;
    h.seed(2, "other.txt", "x", Category::Skills).await;
    potion_collision(&mut h).await;

    // Another writer removes an asset while the wizard is open.
    h.repos.assets.delete(2).await.unwrap();

    let summary = committed(
        h.orchestrator
            .resolve(&mut h.repos, ResolutionAction::AddAsNew)
            .await
            .unwrap(),
    );
    assert_eq!(
        summary.verification,
        Verification::Mismatch {
            expected: 1,
            actual: 0,
            reloaded: true
        }
    );
    assert!(h
        .sink
        .event_types()
        .contains(&"import.verification_mismatch".to_string()));
    assert_eq!(h.repos.assets.library().total_count(), 2);
}

#[tokio::test]
async fn unreadable_files_are_counted_not_imported() {
    let mut h = Harness::new().await;
    let handles = vec![
        h.text("ok.txt", "fine"),
        common::handle("locked.txt", "text/plain", 10),
    ];

    let result = h
        .orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Items)
        .await
        .unwrap();
    let ImportResult::Processed(report) = result else {
        panic!("picker was debounced");
    };
    assert_eq!(report.failed_reads, vec!["locked.txt".to_string()]);
    assert_matches!(report.text, TextOutcome::Committed(s) if s.total_imported == 1);
}

#[tokio::test]
async fn nothing_readable_is_informational() {
    let mut h = Harness::new().await;
    let handles = vec![common::handle("locked.txt", "text/plain", 10)];

    let result = h
        .orchestrator
        .handle_file_picker(&mut h.repos, handles, Category::Items)
        .await
        .unwrap();
    let ImportResult::Processed(report) = result else {
        panic!("picker was debounced");
    };
    assert_eq!(report.text, TextOutcome::NothingToImport);
    assert!(h.sink.event_types().contains(&"import.nothing".to_string()));
    assert!(!h.orchestrator.is_resolving());
}
