//! End-to-end coverage of every subcommand against a temporary database.

use super::helpers::{Workspace, four_site_catalog, ids};
use super::*;
use places_core::SiteStore;
use places_recommender::{LedgerError, RecommendError};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn seeded() -> Workspace {
    Workspace::new().seeded()
}

fn stats_of(workspace: &Workspace, raw: &str) -> places_core::SiteStats {
    let store = SqliteSiteStore::open(workspace.database().as_std_path()).expect("open store");
    let id = SiteId::new(raw).expect("site id");
    store
        .site(&id)
        .expect("look up site")
        .unwrap_or_else(|| panic!("site {raw} missing"))
        .stats
}

#[rstest]
fn ingest_and_refresh_report_counts() {
    let workspace = Workspace::new();
    let catalog = workspace.write_catalog("catalog.json", &four_site_catalog());

    let ingested = workspace.run_ok(&["ingest", "--catalog", catalog.as_str()]);
    assert_eq!(ingested["ingested"], 4);
    assert_eq!(ingested["database"], workspace.database().as_str());

    let report = workspace.run_ok(&["refresh"]);
    assert_eq!(report["refreshed"], 4);
    assert_eq!(report["failures"], json!([]));
}

#[rstest]
fn nearest_lists_closest_first(seeded: Workspace) {
    let nearest = seeded.run_ok(&["nearest", "--site", "A"]);
    assert_eq!(ids(&nearest), ["D", "B", "C"]);

    let distances: Vec<f64> = nearest
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["distance_km"].as_f64().expect("distance"))
        .collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!((distances[0] - 55.6).abs() < 0.1, "A to D is half a degree");
}

#[rstest]
#[case("nearest", &["D", "B"])]
#[case("similar", &["B", "D"])]
fn cached_reads_honour_the_limit(
    seeded: Workspace,
    #[case] command: &str,
    #[case] expected: &[&str],
) {
    let listed = seeded.run_ok(&[command, "--site", "A", "--limit", "2"]);
    assert_eq!(ids(&listed), expected);
}

#[rstest]
fn cached_reads_never_exceed_three(seeded: Workspace) {
    let listed = seeded.run_ok(&["nearest", "--site", "A", "--limit", "10"]);
    assert_eq!(ids(&listed), ["D", "B", "C"]);
}

#[rstest]
#[case("A", &["B", "D"])]
#[case("C", &["D"])]
#[case("D", &["A", "B", "C"])]
fn similar_lists_category_matches_in_catalog_order(
    seeded: Workspace,
    #[case] site: &str,
    #[case] expected: &[&str],
) {
    let similar = seeded.run_ok(&["similar", "--site", site]);
    assert_eq!(ids(&similar), expected);
}

#[rstest]
fn reads_before_refresh_are_empty() {
    let workspace = Workspace::new();
    let catalog = workspace.write_catalog("catalog.json", &four_site_catalog());
    workspace.run_ok(&["ingest", "--catalog", catalog.as_str()]);

    assert_eq!(workspace.run_ok(&["nearest", "--site", "A"]), json!([]));
    assert_eq!(workspace.run_ok(&["similar", "--site", "A"]), json!([]));
}

#[rstest]
fn ratings_update_the_mean_and_the_sentinel_clears(seeded: Workspace) {
    seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "9"]);
    seeded.run_ok(&["rate", "--user", "bo", "--site", "B", "--value", "5"]);
    seeded.run_ok(&["rate", "--user", "ana", "--site", "D", "--value", "4"]);

    let related = seeded.run_ok(&["related", "--site", "A"]);
    assert_eq!(ids(&related), ["B", "D"]);
    assert_eq!(related[0]["rating_mean"], 7.0);
    assert_eq!(related[0]["rating_count"], 2);

    let record = seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "6"]);
    assert_eq!(record["rating"], 6);
    let stats = stats_of(&seeded, "B");
    assert_eq!(stats.rating.count, 1);
    assert!((stats.rating.mean - 5.0).abs() < f64::EPSILON);
}

#[rstest]
fn related_respects_the_limit(seeded: Workspace) {
    seeded.run_ok(&["rate", "--user", "ana", "--site", "D", "--value", "8"]);
    let related = seeded.run_ok(&["related", "--site", "A", "--limit", "1"]);
    assert_eq!(ids(&related), ["D"]);
}

#[rstest]
fn ratings_above_ten_are_rejected(seeded: Workspace) {
    let err = seeded
        .run(&["rate", "--user", "ana", "--site", "B", "--value", "11"])
        .expect_err("out of range rating");
    match err {
        CliError::Ledger(LedgerError::InvalidRating(_)) => {}
        other => panic!("expected InvalidRating, found {other:?}"),
    }
    assert_eq!(stats_of(&seeded, "B").rating.count, 0);
}

#[rstest]
fn repeated_visits_count_once(seeded: Workspace) {
    let first = seeded.run_ok(&["visit", "--user", "ana", "--site", "C"]);
    seeded.run_ok(&["visit", "--user", "ana", "--site", "C"]);
    seeded.run_ok(&["visit", "--user", "bo", "--site", "C"]);

    assert_eq!(first["visited"], true);
    let stats = stats_of(&seeded, "C");
    assert_eq!(stats.visit_count, 2);
    assert!(stats.last_visit_at.is_some());
}

#[rstest]
fn liking_twice_restores_the_count(seeded: Workspace) {
    let liked = seeded.run_ok(&["like", "--user", "ana", "--site", "A"]);
    assert_eq!(liked["liked"], true);
    assert_eq!(stats_of(&seeded, "A").like_count, 1);

    let unliked = seeded.run_ok(&["like", "--user", "ana", "--site", "A"]);
    assert_eq!(unliked["liked"], false);
    assert_eq!(stats_of(&seeded, "A").like_count, 0);
}

#[rstest]
fn opinions_replace_previous_text(seeded: Workspace) {
    seeded.run_ok(&["opinion", "--user", "ana", "--site", "D", "--text", "Too loud"]);
    let record = seeded.run_ok(&["opinion", "--user", "ana", "--site", "D", "--text", "Great coffee"]);
    assert_eq!(record["opinion"], "Great coffee");
    assert_eq!(record["user_id"], "ana");
    assert_eq!(record["site_id"], "D");
}

#[rstest]
#[case::visit(&["visit", "--user", "ana", "--site", "Z"])]
#[case::like(&["like", "--user", "ana", "--site", "Z"])]
fn interactions_with_unknown_sites_fail(seeded: Workspace, #[case] args: &[&str]) {
    match seeded.run(args).expect_err("unknown site") {
        CliError::Ledger(LedgerError::NotFound { site_id }) => assert_eq!(site_id.as_str(), "Z"),
        other => panic!("expected NotFound, found {other:?}"),
    }
}

#[rstest]
fn related_for_unknown_site_fails(seeded: Workspace) {
    match seeded.run(&["related", "--site", "Z"]).expect_err("unknown site") {
        CliError::Recommend(RecommendError::NotFound { site_id }) => {
            assert_eq!(site_id.as_str(), "Z");
        }
        other => panic!("expected NotFound, found {other:?}"),
    }
}

#[rstest]
fn reingesting_keeps_aggregates(seeded: Workspace) {
    seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "9"]);
    seeded.run_ok(&["visit", "--user", "ana", "--site", "B"]);

    let catalog = seeded.path("catalog.json");
    let summary = seeded.run_ok(&["ingest", "--catalog", catalog.as_str()]);
    assert_eq!(summary["ingested"], 4);

    let stats = stats_of(&seeded, "B");
    assert_eq!(stats.visit_count, 1);
    assert_eq!(stats.rating.count, 1);
}

#[rstest]
fn reset_reviews_keeps_the_catalog(seeded: Workspace) {
    seeded.run_ok(&["like", "--user", "ana", "--site", "A"]);
    seeded.run_ok(&["like", "--user", "bo", "--site", "B"]);

    let summary = seeded.run_ok(&["reset", "--reviews-only"]);
    assert_eq!(summary, json!({ "scope": "reviews", "removed": 2 }));
    assert_eq!(ids(&seeded.run_ok(&["nearest", "--site", "A"])), ["D", "B", "C"]);

    assert_eq!(stats_of(&seeded, "A").like_count, 0);
    assert_eq!(stats_of(&seeded, "B").like_count, 0);

    let relike = seeded.run_ok(&["like", "--user", "ana", "--site", "A"]);
    assert_eq!(relike["liked"], true);
    assert_eq!(stats_of(&seeded, "A").like_count, 1);
}

#[rstest]
fn reset_reviews_clears_rating_aggregates(seeded: Workspace) {
    seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "4"]);
    seeded.run_ok(&["visit", "--user", "ana", "--site", "B"]);
    seeded.run_ok(&["reset", "--reviews-only"]);

    seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "4"]);
    seeded.run_ok(&["rate", "--user", "ana", "--site", "B", "--value", "6"]);

    let site = seeded.run_ok(&["show", "--site", "B"]);
    assert_eq!(site["stats"]["rating"], json!({ "count": 0, "mean": 0.0 }));
    assert_eq!(site["stats"]["visit_count"], 0);
}

#[rstest]
fn reset_catalog_removes_sites_and_caches(seeded: Workspace) {
    let summary = seeded.run_ok(&["reset"]);
    assert_eq!(summary, json!({ "scope": "catalog", "removed": 4 }));
    assert_eq!(seeded.run_ok(&["nearest", "--site", "A"]), json!([]));
}

#[rstest]
fn show_prints_live_aggregates(seeded: Workspace) {
    seeded.run_ok(&["visit", "--user", "ana", "--site", "C"]);
    seeded.run_ok(&["like", "--user", "ana", "--site", "C"]);
    seeded.run_ok(&["rate", "--user", "ana", "--site", "C", "--value", "9"]);

    let site = seeded.run_ok(&["show", "--site", "C"]);
    assert_eq!(site["id"], "C");
    assert_eq!(site["name"], "Gallery");
    assert_eq!(site["stats"]["visit_count"], 1);
    assert_eq!(site["stats"]["like_count"], 1);
    assert_eq!(site["stats"]["rating"], json!({ "count": 1, "mean": 9.0 }));
}

#[rstest]
fn show_for_unknown_site_fails(seeded: Workspace) {
    match seeded.run(&["show", "--site", "Z"]).expect_err("unknown site") {
        CliError::SiteNotFound { site_id } => assert_eq!(site_id.as_str(), "Z"),
        other => panic!("expected SiteNotFound, found {other:?}"),
    }
}

#[rstest]
fn sites_lists_the_catalog_in_order(seeded: Workspace) {
    let sites = seeded.run_ok(&["sites"]);
    assert_eq!(ids(&sites), ["A", "B", "C", "D"]);
}
