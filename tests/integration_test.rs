// Integration tests for GeoRank
use georank_core::pipeline::run_all;
use georank_core::{Error, RecommendConfig, RecommendRequest, Stage, EARTH_RADIUS_METERS};
use georank_storage::StorageManager;
use std::io::Write;
use std::path::Path;

const SEED_LAT: f64 = 39.95;
const SEED_LON: f64 = -75.16;

fn lat_north(meters: f64) -> f64 {
    SEED_LAT + (meters / EARTH_RADIUS_METERS).to_degrees()
}

fn write_lines(path: &Path, lines: &[String]) {
    let mut file = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
}

fn business_line(id: &str, meters_north: f64, categories: &str) -> String {
    serde_json::json!({
        "business_id": id,
        "name": format!("Business {}", id),
        "latitude": lat_north(meters_north),
        "longitude": SEED_LON,
        "categories": categories,
        "review_count": 999,
        "city": "Philadelphia",
        "is_open": 1,
    })
    .to_string()
}

fn review_lines(business_id: &str, stars: u8, useful: u32, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            serde_json::json!({
                "review_id": format!("{}-{}", business_id, i),
                "user_id": "u1",
                "business_id": business_id,
                "stars": stars as f64,
                "useful": useful,
                "funny": 0,
                "cool": 0,
                "text": "ok",
                "date": format!("2020-01-{:02} 12:00:00", i + 1),
            })
            .to_string()
        })
        .collect()
}

/// Ingest the pizza fixture into a fresh storage manager rooted at `dir`
fn ingest_fixture(dir: &Path) -> StorageManager {
    let businesses = dir.join("business.jsonl");
    let reviews = dir.join("review.jsonl");

    write_lines(
        &businesses,
        &[
            business_line("A", 0.0, "Pizza, Italian"),
            business_line("B", 3000.0, "Pizza, Bar"),
            business_line("C", 4000.0, "Pizza, Italian, Delivery"),
            business_line("D", 6000.0, "Pizza, Italian"),
            business_line("E", 50.0, "Hair Salons"),
        ],
    );
    let mut all = review_lines("B", 4, 0, 5);
    all.extend(review_lines("C", 2, 0, 5));
    all.extend(review_lines("D", 5, 0, 5));
    write_lines(&reviews, &all);

    let storage = StorageManager::new(dir.join("data")).unwrap();
    assert_eq!(storage.ingest_businesses(&businesses).unwrap(), 5);
    assert_eq!(storage.ingest_reviews(&reviews).unwrap(), 15);
    storage
}

#[test]
fn test_end_to_end_recommendation() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());
    let catalog = storage.catalog();

    let reports = run_all(&catalog).unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].stage, Stage::AdjustReviewScores);
    assert_eq!(reports[0].records, 15);

    let recs = catalog
        .recommend(&RecommendRequest::new("A", 5000.0), &RecommendConfig::default())
        .unwrap();
    let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);
    assert!((recs[0].recommend_score - 2.5).abs() < 1e-9);
    assert!((recs[1].recommend_score - 2.0).abs() < 1e-9);
    assert_eq!(recs[1].category_overlap, 2);
    assert_eq!(recs[0].fields.get("city"), Some(&serde_json::json!("Philadelphia")));
    assert!(recs[0].fields.get("is_open").is_none());
}

#[test]
fn test_far_candidate_needs_wider_radius() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());
    let catalog = storage.catalog();
    run_all(&catalog).unwrap();

    let recs = catalog
        .recommend(&RecommendRequest::new("A", 10_000.0), &RecommendConfig::default())
        .unwrap();
    // D: avg 5 over 5 reviews -> 2.5 credibility, plus 2 shared categories
    assert_eq!(recs[0].id, "D");
    assert!((recs[0].recommend_score - 3.5).abs() < 1e-9);
    assert_eq!(recs.len(), 3);
}

#[test]
fn test_review_count_is_derived_not_ingested() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());
    let catalog = storage.catalog();
    run_all(&catalog).unwrap();

    assert_eq!(catalog.get_business("B").unwrap().review_count, Some(5));
    assert_eq!(catalog.get_business("A").unwrap().review_count, Some(0));
    assert_eq!(catalog.get_business("A").unwrap().credibility_score, None);
}

#[test]
fn test_reviews_listing_order() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());
    let catalog = storage.catalog();
    run_all(&catalog).unwrap();

    // Equal adjusted scores: newest first
    let reviews = catalog.reviews_for("B").unwrap();
    assert_eq!(reviews.len(), 5);
    assert_eq!(reviews[0].review_id, "B-4");
    assert_eq!(reviews[4].review_id, "B-0");

    assert!(catalog.reviews_for("A").unwrap().is_empty());
    assert!(matches!(catalog.reviews_for("nope"), Err(Error::BusinessNotFound(_))));
}

#[test]
fn test_unknown_seed_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());
    let catalog = storage.catalog();
    run_all(&catalog).unwrap();

    let err = catalog
        .recommend(&RecommendRequest::new("missing", 5000.0), &RecommendConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::BusinessNotFound(id) if id == "missing"));
}

#[test]
fn test_query_before_preprocessing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ingest_fixture(dir.path());

    let err = storage
        .catalog()
        .recommend(&RecommendRequest::new("A", 5000.0), &RecommendConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Computation(_)));
}

#[test]
fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let expected = {
        let storage = ingest_fixture(dir.path());
        run_all(&storage.catalog()).unwrap();
        storage.save().unwrap();
        storage
            .catalog()
            .recommend(&RecommendRequest::new("A", 5000.0), &RecommendConfig::default())
            .unwrap()
    };

    let reopened = StorageManager::new(dir.path().join("data")).unwrap();
    let catalog = reopened.catalog();
    assert_eq!(catalog.business_count(), 5);
    assert_eq!(catalog.review_count(), 15);
    assert!(catalog.stage_status().is_done(Stage::SplitCategories));

    let recs = catalog
        .recommend(&RecommendRequest::new("A", 5000.0), &RecommendConfig::default())
        .unwrap();
    assert_eq!(recs.len(), expected.len());
    for (got, want) in recs.iter().zip(&expected) {
        assert_eq!(got.id, want.id);
        assert!((got.recommend_score - want.recommend_score).abs() < 1e-9);
        assert!((got.distance - want.distance).abs() < 1e-6);
    }
}

#[test]
fn test_bad_export_line_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("business.jsonl");
    write_lines(&path, &["{\"business_id\": \"x\"}".to_string()]);

    let storage = StorageManager::new(dir.path().join("data")).unwrap();
    assert!(matches!(storage.ingest_businesses(&path), Err(Error::Storage(_))));
    assert_eq!(storage.catalog().business_count(), 0);
}
