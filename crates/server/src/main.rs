//! Test harness for the review orchestrator.
//!
//! Loads the sample seed directory, submits one review, then lists and
//! enriches the reviews for that movie while printing enrichment progress.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use reconcile::ReconcileScope;
use review_store::SeedData;
use server::{Actor, EnrichmentEvent, ReviewError, ReviewOrchestrator, ServiceConfig, SubmitRequest};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,reconcile=debug,text_pipeline=debug,sentiment_client=debug")
        .init();

    info!("Starting review service test harness");

    let data_dir = Path::new("data/reviews");
    let stores = SeedData::load_from_dir(data_dir)
        .and_then(|seed| seed.into_stores())
        .with_context(|| format!("Failed to load seed data from {}", data_dir.display()))?;

    let addr = std::env::var("REEL_REVIEWS_CLASSIFIER_ADDR")
        .unwrap_or_else(|_| server::config::DEFAULT_CLASSIFIER_ADDR.to_string());
    info!("Using classification service at {}", addr);
    let orchestrator =
        ReviewOrchestrator::from_config(stores.into(), ServiceConfig::default().with_classifier_addr(addr))?;

    let movie_id = 1;
    let actor = Actor::user("harness", "Test Harness");
    let submission = orchestrator
        .submit(
            &actor,
            SubmitRequest {
                movie_id,
                stars: 4,
                text: "Still holds up. The toys feel alive and the jokes land for every age.".to_string(),
            },
        )
        .await;
    match submission {
        Ok(outcome) => info!(
            "Submitted review {} (legacy copy: {})",
            outcome.review.id, outcome.legacy_replicated
        ),
        // Re-running the harness hits the one-review-per-movie rule
        Err(ReviewError::Validation(e)) => info!("Submission rejected: {}", e),
        Err(e) => return Err(e.into()),
    }

    let mut reviews = orchestrator.load_reviews(&ReconcileScope::Movie(movie_id)).await?;
    info!(
        "Loaded {} reviews for {}",
        reviews.len(),
        orchestrator
            .movie_title(movie_id)
            .unwrap_or_else(|| format!("movie {}", movie_id))
    );

    let (tx, mut rx) = mpsc::channel::<EnrichmentEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!("  {} -> {:?} {:?}", event.review_id, event.state, event.sentiment);
        }
    });

    let cancel = CancellationToken::new();
    let report = orchestrator.enrich(&mut reviews, &cancel, Some(&tx)).await;
    drop(tx);
    printer.await?;
    info!(
        "Enriched {} of {} pending reviews in {} batches",
        report.enriched, report.pending, report.batches
    );

    for (i, review) in reviews.iter().enumerate() {
        info!(
            "{}. [{}★] {} ({:?}) - {}",
            i + 1,
            review.star_rating,
            review.author_display_name,
            review.sentiment_label(),
            orchestrator.summarize(&review.text)
        );
    }

    let stats = orchestrator.stats(&ReconcileScope::Movie(movie_id)).await?;
    info!(
        "Average rating {:.2} over {} reviews, distribution {:?}",
        stats.average_rating, stats.total_reviews, stats.rating_distribution
    );

    Ok(())
}
