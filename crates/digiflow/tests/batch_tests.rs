//! End-to-end tests for batch sessions: property editing, container
//! duplication and correction round trips over several processes.

mod common;

use common::{seed_process, TestHarness};

use digiflow::db::{history_repo, process_repo, property_repo, step_repo};
use digiflow::properties::PropertyTemplate;
use digiflow::{BatchSession, MessageLog, StepStatus};

fn open_batch(
    harness: &TestHarness,
    process_ids: &[i64],
    step_title: &str,
    templates: Vec<PropertyTemplate>,
) -> BatchSession {
    let mut steps = Vec::new();
    for id in process_ids {
        steps.push(
            step_repo::find_by_title(&harness.db, *id, step_title)
                .unwrap()
                .unwrap(),
        );
    }
    BatchSession::new(harness.db.clone(), harness.catalog.clone(), templates, steps)
        .expect("Failed to open batch session")
}

fn required_template(name: &str) -> PropertyTemplate {
    PropertyTemplate {
        name: name.to_string(),
        required: true,
        pattern: None,
        steps: Vec::new(),
    }
}

// ── property saving ──

#[test]
fn invalid_property_aborts_the_save_for_every_process() {
    let harness = TestHarness::new();
    let ids: Vec<i64> = (1..=2)
        .map(|i| {
            seed_process(
                &harness.db,
                &format!("Journal_{i}"),
                &[("Metadata", 1, 1)],
            )
            .id
        })
        .collect();

    let mut session = open_batch(
        &harness,
        &ids,
        "Metadata",
        vec![required_template("Shelfmark")],
    );
    // A required property left empty fails validation.
    let mut log = MessageLog::new();
    session.save_container_for_all(0, &mut log).unwrap();

    assert!(log.has_errors());
    for id in &ids {
        assert!(
            property_repo::list_for_process(&harness.db, *id)
                .unwrap()
                .is_empty(),
            "nothing may be written when validation fails"
        );
    }
}

#[test]
fn valid_properties_are_saved_to_every_process() {
    let harness = TestHarness::new();
    let ids: Vec<i64> = (1..=3)
        .map(|i| {
            seed_process(
                &harness.db,
                &format!("Map_{i}"),
                &[("Metadata", 1, 1)],
            )
            .id
        })
        .collect();

    let mut session = open_batch(
        &harness,
        &ids,
        "Metadata",
        vec![required_template("Shelfmark")],
    );
    for property in session.properties_mut() {
        property.value = "Sig. 44/7".to_string();
    }
    let mut log = MessageLog::new();
    session.save_container_for_all(0, &mut log).unwrap();
    assert!(!log.has_errors());

    for id in &ids {
        let rows = property_repo::list_for_process(&harness.db, *id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("Shelfmark"));
        assert_eq!(rows[0].value, "Sig. 44/7");
    }
}

// ── container duplication ──

#[test]
fn duplication_picks_the_smallest_unused_container_id() {
    let harness = TestHarness::new();
    let process = seed_process(&harness.db, "Codex_9", &[("Metadata", 1, 1)]);
    for (title, container) in [("Author", 1), ("Title", 1), ("Author", 3)] {
        property_repo::insert(
            &harness.db,
            process.id,
            Some(title),
            "x",
            container,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
    }

    let mut session = open_batch(&harness, &[process.id], "Metadata", Vec::new());
    let mut log = MessageLog::new();
    session.duplicate_container(1, &mut log).unwrap();
    assert!(!log.has_errors());

    let rows = property_repo::list_for_process(&harness.db, process.id).unwrap();
    let copies: Vec<_> = rows.iter().filter(|r| r.container == 2).collect();
    assert_eq!(copies.len(), 2, "the gap between 1 and 3 must be filled");
    assert!(rows.iter().all(|r| r.container != 4));
}

#[test]
fn container_zero_is_never_duplicated() {
    let harness = TestHarness::new();
    let process = seed_process(&harness.db, "Codex_10", &[("Metadata", 1, 1)]);
    property_repo::insert(
        &harness.db,
        process.id,
        Some("Shelfmark"),
        "x",
        0,
        "2026-01-01T00:00:00Z",
    )
    .unwrap();

    let mut session = open_batch(&harness, &[process.id], "Metadata", Vec::new());
    let mut log = MessageLog::new();
    session.duplicate_container(0, &mut log).unwrap();

    assert!(log.has_errors());
    let rows = property_repo::list_for_process(&harness.db, process.id).unwrap();
    assert_eq!(rows.len(), 1);
}

// ── corrections ──

#[test]
fn problem_report_reopens_the_target_and_locks_everything_after() {
    let harness = TestHarness::new();
    let process = seed_process(
        &harness.db,
        "Incunable_3",
        &[
            ("Scanning", 1, StepStatus::Done.value()),
            ("Image check", 2, StepStatus::Done.value()),
            ("Metadata", 3, StepStatus::InWork.value()),
        ],
    );

    let mut session = open_batch(&harness, &[process.id], "Metadata", Vec::new());
    session.problem_step = Some("Scanning".to_string());
    session.problem_message = "Page 14 is cropped".to_string();
    let mut log = MessageLog::new();
    session.report_problem(&mut log).unwrap();
    assert!(!log.has_errors());

    let steps = step_repo::list_for_process(&harness.db, process.id).unwrap();
    let scanning = steps.iter().find(|s| s.title == "Scanning").unwrap();
    assert_eq!(scanning.status, StepStatus::Open.value());
    assert!(scanning.correction);
    assert!(scanning.started_at.is_none());

    for title in ["Image check", "Metadata"] {
        let step = steps.iter().find(|s| s.title == title).unwrap();
        assert_eq!(step.status, StepStatus::Locked.value(), "{title}");
        assert!(step.correction, "{title}");
    }

    let wiki = process_repo::find_by_id(&harness.db, process.id)
        .unwrap()
        .unwrap()
        .wiki_log;
    assert!(wiki.contains("error"));
    assert!(wiki.contains("Page 14 is cropped"));

    let history = history_repo::list_for_process(&harness.db, process.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text_value.as_deref(), Some("Scanning"));
}

#[test]
fn solving_a_problem_closes_the_span_and_reopens_the_solution_step() {
    let harness = TestHarness::new();
    let process = seed_process(
        &harness.db,
        "Incunable_4",
        &[
            ("Scanning", 1, StepStatus::Open.value()),
            ("Image check", 2, StepStatus::Locked.value()),
            ("Metadata", 3, StepStatus::Locked.value()),
        ],
    );

    let mut session = open_batch(&harness, &[process.id], "Scanning", Vec::new());
    session.solution_step = Some("Metadata".to_string());
    session.solution_message = "Rescanned page 14".to_string();
    let mut log = MessageLog::new();
    session.solve_problem(&mut log).unwrap();
    assert!(!log.has_errors());

    let steps = step_repo::list_for_process(&harness.db, process.id).unwrap();
    for title in ["Scanning", "Image check"] {
        let step = steps.iter().find(|s| s.title == title).unwrap();
        assert_eq!(step.status, StepStatus::Done.value(), "{title}");
        assert!(!step.correction, "{title}");
    }
    let metadata = steps.iter().find(|s| s.title == "Metadata").unwrap();
    assert_eq!(metadata.status, StepStatus::Open.value());
}
