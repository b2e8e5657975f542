//! End-to-end review lifecycle over a seed directory.
//!
//! Uses in-memory stores loaded from a temporary seed directory and a
//! keyword classification backend, then writes the stores back and reloads
//! them to check what actually persisted.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reconcile::ReconcileScope;
use review_store::{
    EnrichmentState, PrimaryStore, SeedData, SeededStores, SentimentLabel, SourceStore,
};
use sentiment_client::{ClassificationBackend, ClassifierError, RawPrediction, SentimentClassifier};
use server::{Actor, EnrichmentEvent, ReviewError, ReviewOrchestrator, ServiceConfig, SubmitRequest};
use text_pipeline::{ModerationGate, ProfanityFilter, TermListSpamChecker};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Labels by keyword, in the lowercase vocabulary some models use
struct KeywordBackend;

#[async_trait]
impl ClassificationBackend for KeywordBackend {
    async fn predict(&self, text: &str) -> Result<RawPrediction, ClassifierError> {
        let text = text.to_lowercase();
        let label = if text.contains("loved") || text.contains("classic") {
            "pos"
        } else if text.contains("boring") {
            "neg"
        } else {
            "neu"
        };
        Ok(RawPrediction {
            label: label.to_string(),
            score: 0.75,
        })
    }
}

fn write_seed(dir: &Path) {
    std::fs::write(
        dir.join("reviews.dat"),
        "p1::1::alice::Alice::5::1700000000000::positive::90::::::Loved every minute\n\
         p2::1::bob::Bob::2::1700000100000::::::::::Boring middle act\n\
         p3::2::alice::Alice::4::1700000200000::::::::::Good sequel\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("legacy_reviews.dat"),
        "1::carol::Carol::4.5::1600000000000::::::A classic\n\
         1::::::2.5::1600000100000::::::Fine I guess\n\
         1::dave::Dave::3.0::1600000200000::POSITIVE::0.6::Better than expected\n",
    )
    .unwrap();
    std::fs::write(dir.join("movies.dat"), "1::Toy Story (1995)::Animation|Comedy\n").unwrap();
}

fn load(dir: &Path) -> SeededStores {
    SeedData::load_from_dir(dir).unwrap().into_stores().unwrap()
}

fn build(stores: &SeededStores) -> ReviewOrchestrator {
    let gate = ModerationGate::new(
        ProfanityFilter::with_default_list().unwrap(),
        Arc::new(TermListSpamChecker::with_default_list().unwrap()),
    );
    let classifier = SentimentClassifier::new(Arc::new(KeywordBackend));
    let config = ServiceConfig::default()
        .with_enrichment_batch_size(2)
        .with_batch_pause(Duration::from_millis(1));
    ReviewOrchestrator::new(stores.clone().into(), classifier, gate, config)
}

#[tokio::test]
async fn test_full_lifecycle_persists() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let stores = load(dir.path());
    let orchestrator = build(&stores);

    let erin = Actor::user("erin", "Erin");
    let outcome = orchestrator
        .submit(
            &erin,
            SubmitRequest {
                movie_id: 1,
                stars: 5,
                text: "Loved it, a damn fine classic".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(outcome.text_altered);
    assert_eq!(outcome.review.sentiment_label(), Some(SentimentLabel::Positive));

    orchestrator.like(&Actor::user("bob", "Bob"), "p1").await.unwrap();
    orchestrator.dislike(&erin, "p2").await.unwrap();

    stores.save_to_dir(dir.path()).await.unwrap();
    let reloaded = load(dir.path());

    let p1 = reloaded.primary.get("p1").await.unwrap().unwrap();
    assert_eq!(p1.like_count, 1);
    let p2 = reloaded.primary.get("p2").await.unwrap().unwrap();
    assert!(p2.disliked_by.contains("erin"));

    let erin_rows = reloaded.primary.fetch_by_author("erin").await.unwrap();
    assert_eq!(erin_rows.len(), 1);
    assert_eq!(erin_rows[0].text, "Loved it, a **** fine classic");

    // Both copies of the new review survived the round trip; the primary
    // one sorts first on the shared timestamp
    let merged = build(&reloaded)
        .load_reviews(&ReconcileScope::Movie(1))
        .await
        .unwrap();
    assert_eq!(merged.len(), 7);
    assert_eq!(merged[0].source_store, SourceStore::Primary);
    assert_eq!(merged[0].author_display_name, "Erin");
    assert_eq!(merged[1].source_store, SourceStore::Legacy);
    assert_eq!(merged[1].author_display_name, "Erin");
}

#[tokio::test]
async fn test_load_and_enrich_movie() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let stores = load(dir.path());
    let orchestrator = build(&stores);

    let mut reviews = orchestrator.load_reviews(&ReconcileScope::Movie(1)).await.unwrap();
    let ids: Vec<_> = reviews.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["p2", "p1", "1600000200000-dave", "1600000100000-anonymous", "1600000000000-carol"]
    );
    assert_eq!(reviews[3].star_rating, 3);
    assert_eq!(reviews[4].star_rating, 5);

    let pending_before = reviews.iter().filter(|r| r.needs_enrichment()).count();
    assert_eq!(pending_before, 3);

    let (tx, mut rx) = mpsc::channel::<EnrichmentEvent>(64);
    let report = orchestrator
        .enrich(&mut reviews, &CancellationToken::new(), Some(&tx))
        .await;
    drop(tx);

    // Batch size 2 over 3 pending reviews
    assert_eq!(report.batches, 2);
    assert_eq!(report.enriched, 3);
    assert!(reviews.iter().all(|r| r.enrichment_state == EnrichmentState::Done));
    assert_eq!(reviews[0].sentiment_label(), Some(SentimentLabel::Negative));
    assert_eq!(reviews[4].sentiment_label(), Some(SentimentLabel::Positive));

    let mut done = 0;
    while let Some(event) = rx.recv().await {
        if event.state == EnrichmentState::Done {
            done += 1;
        }
    }
    assert_eq!(done, 3);
}

#[tokio::test]
async fn test_author_scope_spans_stores_and_movies() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let orchestrator = build(&load(dir.path()));

    let alice = orchestrator
        .load_reviews(&ReconcileScope::Author("alice".to_string()))
        .await
        .unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|r| r.source_store == SourceStore::Primary));

    let carol = orchestrator
        .load_reviews(&ReconcileScope::Author("carol".to_string()))
        .await
        .unwrap();
    assert_eq!(carol.len(), 1);
    assert_eq!(carol[0].source_store, SourceStore::Legacy);
}

#[tokio::test]
async fn test_dedup_keeps_latest_and_leaves_legacy_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let stores = load(dir.path());
    let orchestrator = build(&stores);

    // A duplicate that slipped in before the one-review rule existed
    let mut older = stores.primary.get("p1").await.unwrap().unwrap();
    older.id = "p1-old".to_string();
    older.created_at = older.created_at - chrono::Duration::days(30);
    stores.primary.insert(older).await.unwrap();

    let report = orchestrator.dedup(1).await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(stores.primary.get("p1").await.unwrap().is_some());
    assert!(stores.primary.get("p1-old").await.unwrap().is_none());
    assert_eq!(stores.legacy.len().await, 3);

    let again = orchestrator.dedup(1).await.unwrap();
    assert_eq!(again.removed, 0);
}

#[tokio::test]
async fn test_stats_for_movie() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let orchestrator = build(&load(dir.path()));

    let stats = orchestrator.stats(&ReconcileScope::Movie(1)).await.unwrap();
    // Stars: 5, 2, legacy 4.5→5, 2.5→3, 3.0→3
    assert_eq!(stats.total_reviews, 5);
    assert_eq!(stats.rating_distribution, [0, 1, 2, 0, 2]);
    assert!((stats.average_rating - 3.6).abs() < 1e-9);
    assert_eq!(stats.reviews_by_month.len(), 2);
}

#[tokio::test]
async fn test_votes_on_legacy_rows_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let orchestrator = build(&load(dir.path()));

    let result = orchestrator
        .like(&Actor::user("erin", "Erin"), "1600000000000-carol")
        .await;
    assert!(matches!(result, Err(ReviewError::NotFound(_))));
}
