mod common;

use chrono::{NaiveDate, NaiveDateTime};
use common::{record_from, MemoryCatalog};
use media_catalog_core::{
    primary_fill, Error, MediaCandidate, PrimaryFillOutcome, ReconcileEngine, SilentReporter,
};
use media_catalog_core::{EngineConfig, ReconcileCounters};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const HOST: &str = "laptop";

fn at(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 10, 2)
        .unwrap()
        .and_hms_opt(14, minute, 0)
        .unwrap()
}

fn candidate_on(host: &str, name: &str, size: i64, minute: u32) -> MediaCandidate {
    MediaCandidate::new(
        name.to_string(),
        at(minute),
        at(minute),
        size,
        "i".to_string(),
        BTreeMap::new(),
        BTreeMap::from([(host.to_string(), format!("/{}/photos/{}", host, name))]),
        None,
        None,
    )
}

fn candidate(name: &str, size: i64, minute: u32) -> MediaCandidate {
    candidate_on(HOST, name, size, minute)
}

fn sorted(mut candidates: Vec<MediaCandidate>) -> Vec<MediaCandidate> {
    candidates.sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    candidates
}

fn small_config() -> EngineConfig {
    EngineConfig {
        commit_chunk: 2,
        insert_batch: 2,
        page_size: 2,
        rename_probe_cap: 100,
    }
}

fn run(
    catalog: MemoryCatalog,
    candidates: Vec<MediaCandidate>,
) -> (MemoryCatalog, ReconcileCounters) {
    let mut engine = ReconcileEngine::new(catalog, HOST.to_string(), small_config());
    let counters = engine.run(sorted(candidates), &SilentReporter).unwrap();
    (engine.into_store(), counters)
}

#[test]
fn primary_fill_loads_empty_catalog_in_batches() {
    let mut catalog = MemoryCatalog::new();
    let candidates = sorted(vec![
        candidate("a.jpg", 10, 0),
        candidate("b.jpg", 20, 1),
        candidate("c.jpg", 30, 2),
        candidate("d.jpg", 40, 3),
        candidate("e.jpg", 50, 4),
    ]);

    let outcome = primary_fill(&mut catalog, &candidates, &small_config()).unwrap();

    assert_eq!(outcome, PrimaryFillOutcome::Filled(5));
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.begins, 1);
    assert_eq!(catalog.finishes, 1);
    assert!(catalog.checkpoints >= 1);
}

#[test]
fn primary_fill_refuses_non_empty_catalog() {
    let mut catalog =
        MemoryCatalog::with_records(vec![record_from(1, &candidate("a.jpg", 10, 0))]);

    let outcome = primary_fill(&mut catalog, &[candidate("b.jpg", 20, 1)], &small_config()).unwrap();

    assert_eq!(outcome, PrimaryFillOutcome::CatalogNotEmpty);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.begins, 0);
}

#[test]
fn unchanged_files_are_counted_present_without_writes() {
    let files = vec![candidate("a.jpg", 10, 0), candidate("b.jpg", 20, 1)];
    let catalog = MemoryCatalog::with_records(
        files
            .iter()
            .enumerate()
            .map(|(i, c)| record_from(i as i64 + 1, c))
            .collect(),
    );

    let (catalog, counters) = run(catalog, files);

    assert_eq!(counters.exists_here, 2);
    assert_eq!(counters.inserted, 0);
    assert_eq!(counters.updated, 0);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn reconciling_twice_is_idempotent() {
    let files = vec![
        candidate("IMG_0001.jpg", 10, 0),
        candidate("IMG_0002.jpg", 20, 1),
        candidate("holiday-01.png", 30, 2),
    ];

    let (catalog, first) = run(MemoryCatalog::new(), files.clone());
    assert_eq!(first.inserted, 3);

    let (catalog, second) = run(catalog, files);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.exists_here, 3);
    assert_eq!(catalog.len(), 3);
}

#[test]
fn size_collision_gets_a_synthetic_name() {
    let catalog =
        MemoryCatalog::with_records(vec![record_from(1, &candidate("photo.jpg", 100, 0))]);

    let (catalog, counters) = run(catalog, vec![candidate("photo.jpg", 999, 5)]);

    assert_eq!(counters.inserted, 1);
    let original = catalog.get("photo.jpg").unwrap();
    assert_eq!(original.size, 100);
    let renamed = catalog.get("autorenamed_photo.jpg").unwrap();
    assert_eq!(renamed.size, 999);
}

#[test]
fn rename_probes_advance_past_taken_names() {
    // Both the original name and the first probe name hold different
    // content; the candidate lands on the second probe name.
    let catalog = MemoryCatalog::with_records(vec![
        record_from(1, &candidate("photo.jpg", 100, 0)),
        record_from(2, &candidate("autorenamed_photo.jpg", 200, 1)),
    ]);

    let (catalog, counters) = run(catalog, vec![candidate("photo.jpg", 999, 5)]);

    assert_eq!(counters.inserted, 1);
    assert_eq!(catalog.get("autorenamed_1_photo.jpg").unwrap().size, 999);
}

#[test]
fn rename_probe_finding_same_content_inserts_nothing() {
    // A previous run already parked this exact content under the probe
    // name on this host.
    let parked = candidate("autorenamed_photo.jpg", 999, 5);
    let catalog = MemoryCatalog::with_records(vec![
        record_from(1, &candidate("photo.jpg", 100, 0)),
        record_from(2, &parked),
    ]);

    let mut probe = candidate("photo.jpg", 999, 5);
    probe.last_modify = parked.last_modify;
    let (catalog, counters) = run(catalog, vec![probe]);

    assert_eq!(counters.inserted, 0);
    assert_eq!(counters.exists_here, 1);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn exhausted_rename_probes_fail_the_run() {
    let mut records = vec![record_from(1, &candidate("photo.jpg", 100, 0))];
    records.push(record_from(2, &candidate("autorenamed_photo.jpg", 200, 1)));
    records.push(record_from(3, &candidate("autorenamed_1_photo.jpg", 300, 2)));
    let catalog = MemoryCatalog::with_records(records);

    let config = EngineConfig {
        rename_probe_cap: 2,
        ..small_config()
    };
    let mut engine = ReconcileEngine::new(catalog, HOST.to_string(), config);
    let err = engine
        .run(vec![candidate("photo.jpg", 999, 5)], &SilentReporter)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RenameConflict { ref name, probes: 2 } if name == "photo.jpg"
    ));
}

#[test]
fn same_file_on_new_host_unions_paths() {
    // Catalog knows the file from "desktop"; this run sees identical
    // content from "laptop".
    let desktop = candidate_on("desktop", "shared.jpg", 50, 3);
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &desktop)]);

    let mut local = candidate("shared.jpg", 50, 9);
    local.last_modify = desktop.last_modify;
    let (catalog, counters) = run(catalog, vec![local]);

    assert_eq!(counters.updated, 1);
    let record = catalog.get("shared.jpg").unwrap();
    assert_eq!(record.paths.len(), 2);
    assert!(record.paths.contains_key("desktop"));
    assert_eq!(record.paths["laptop"], "/laptop/photos/shared.jpg");
}

#[test]
fn moved_file_updates_the_host_path() {
    let before = candidate("moved.jpg", 50, 3);
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &before)]);

    let mut after = before.clone();
    after
        .paths
        .insert(HOST.to_string(), "/laptop/archive/moved.jpg".to_string());
    let (catalog, counters) = run(catalog, vec![after]);

    assert_eq!(counters.updated, 1);
    assert_eq!(counters.exists_here, 0);
    let record = catalog.get("moved.jpg").unwrap();
    assert_eq!(record.paths[HOST], "/laptop/archive/moved.jpg");
}

#[test]
fn matching_file_seen_from_foreign_host_counts_elsewhere() {
    // Candidates read from an exported media file carry the exporting
    // host's paths, not ours.
    let desktop = candidate_on("desktop", "remote.jpg", 50, 3);
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &desktop)]);

    let (catalog, counters) = run(catalog, vec![desktop.clone()]);

    assert_eq!(counters.exists_elsewhere, 1);
    assert_eq!(counters.updated, 0);
    assert_eq!(catalog.get("remote.jpg").unwrap().paths.len(), 1);
}

#[test]
fn records_without_candidates_are_skipped_and_counted_by_host() {
    // Nothing this run matches either record. The foreign-host record is
    // noted as existing elsewhere; the local one is passed over silently.
    // Neither is touched.
    let foreign = candidate_on("desktop", "b.jpg", 20, 1);
    let local = candidate("c.jpg", 30, 2);
    let catalog =
        MemoryCatalog::with_records(vec![record_from(1, &foreign), record_from(2, &local)]);

    let (catalog, counters) = run(catalog, vec![candidate("d.jpg", 40, 3)]);

    assert_eq!(counters.exists_elsewhere, 1);
    assert_eq!(counters.exists_here, 0);
    assert_eq!(counters.inserted, 1);
    assert_eq!(counters.updated, 0);
    let untouched = catalog.get("b.jpg").unwrap();
    assert_eq!(untouched.size, 20);
    assert_eq!(untouched.paths.len(), 1);
    assert!(untouched.paths.contains_key("desktop"));
    assert_eq!(catalog.get("c.jpg").unwrap().size, 30);
    assert_eq!(catalog.len(), 3);
}

#[test]
fn null_catalog_hash_is_backfilled() {
    let stored = candidate("hashme.jpg", 50, 3);
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &stored)]);

    let fingerprinted = stored.clone().with_content_hash("cafe".to_string());
    let (catalog, counters) = run(catalog, vec![fingerprinted]);

    assert_eq!(counters.updated, 1);
    assert_eq!(counters.exists_here, 1);
    let record = catalog.get("hashme.jpg").unwrap();
    assert_eq!(record.content_hash.as_deref(), Some("cafe"));
    assert_eq!(record.paths.len(), 1);
}

#[test]
fn backfill_applies_even_when_identity_is_unconfirmed() {
    // Same name and size but a different modification time: identity
    // stays unconfirmed and paths untouched, yet the null hash is filled.
    let stored = candidate("maybe.jpg", 50, 3);
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &stored)]);

    let other = candidate("maybe.jpg", 50, 7).with_content_hash("beef".to_string());
    let (catalog, counters) = run(catalog, vec![other]);

    assert_eq!(counters.updated, 1);
    assert_eq!(counters.exists_here, 0);
    let record = catalog.get("maybe.jpg").unwrap();
    assert_eq!(record.content_hash.as_deref(), Some("beef"));
    assert_eq!(record.paths.len(), 1);
}

#[test]
fn hash_equality_confirms_identity_across_differing_mtimes() {
    let stored = candidate("copied.jpg", 50, 3).with_content_hash("feed".to_string());
    let catalog = MemoryCatalog::with_records(vec![record_from(1, &stored)]);

    // A copy elsewhere on the same host: fresh mtime, same content.
    let mut copied = candidate("copied.jpg", 50, 8).with_content_hash("feed".to_string());
    copied
        .paths
        .insert(HOST.to_string(), "/laptop/backup/copied.jpg".to_string());
    let (catalog, counters) = run(catalog, vec![copied]);

    assert_eq!(counters.updated, 1);
    assert_eq!(
        catalog.get("copied.jpg").unwrap().paths[HOST],
        "/laptop/backup/copied.jpg"
    );
}

#[test]
fn candidates_past_the_catalog_end_are_batch_inserted() {
    let catalog =
        MemoryCatalog::with_records(vec![record_from(1, &candidate("aaa.jpg", 10, 0))]);

    let (catalog, counters) = run(
        catalog,
        vec![
            candidate("aaa.jpg", 10, 0),
            candidate("xxx.jpg", 1, 1),
            candidate("yyy.jpg", 2, 2),
            candidate("zzz.jpg", 3, 3),
        ],
    );

    assert_eq!(counters.inserted, 3);
    assert_eq!(counters.exists_here, 1);
    assert_eq!(catalog.len(), 4);
}

#[test]
fn empty_candidate_set_touches_nothing() {
    let catalog =
        MemoryCatalog::with_records(vec![record_from(1, &candidate("a.jpg", 10, 0))]);

    let (catalog, counters) = run(catalog, vec![]);

    assert_eq!(counters, ReconcileCounters::default());
    assert_eq!(catalog.begins, 0);
    assert_eq!(catalog.finishes, 0);
}

#[test]
fn transaction_checkpoints_follow_mutation_count() {
    let files: Vec<MediaCandidate> = (0..10)
        .map(|i| candidate(&format!("file_{:03}.jpg", i), i, 0))
        .collect();

    let (catalog, counters) = run(MemoryCatalog::new(), files);

    assert_eq!(counters.inserted, 10);
    assert_eq!(catalog.begins, 1);
    assert_eq!(catalog.finishes, 1);
}

#[test]
fn separator_blind_ordering_reconciles_randomized_catalogs() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut names: Vec<String> = (0..200)
        .map(|i| {
            let sep = match rng.random_range(0..3) {
                0 => "_",
                1 => "-",
                _ => "",
            };
            format!("IMG{}{:04}.jpg", sep, i)
        })
        .collect();
    names.shuffle(&mut rng);

    let all: Vec<MediaCandidate> = names
        .iter()
        .map(|name| candidate(name, 100, 0))
        .collect();
    let (known, fresh) = all.split_at(120);

    let mut catalog = MemoryCatalog::new();
    primary_fill(&mut catalog, &sorted(known.to_vec()), &small_config()).unwrap();

    let (catalog, counters) = run(catalog, all.clone());
    assert_eq!(counters.inserted, fresh.len());
    assert_eq!(counters.exists_here, known.len());
    assert_eq!(catalog.len(), all.len());

    let (_, again) = run(catalog, all.clone());
    assert_eq!(again.inserted, 0);
    assert_eq!(again.exists_here, all.len());
}
