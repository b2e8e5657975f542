//! # Review Orchestrator
//!
//! Coordinates the whole review lifecycle:
//! 1. Submit: validate → duplicate check → moderate → classify → dual write
//! 2. Load: reconcile primary and legacy rows into one newest-first list
//! 3. Enrich: backfill missing sentiment in cancellable batches
//! 4. Vote: like/dislike through the interaction ledger
//! 5. Maintain: dedup sweep and statistics
//!
//! ## Failure policy
//! - Classifier down or slow: fallback sentiment, submission continues
//! - Spam checker down: text treated as clean
//! - Legacy write fails: logged, reported in the outcome, not an error
//! - Primary write or either reconciliation fetch fails: error to the caller

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use reconcile::{compute_stats, DedupReport, DedupSweep, ReconcileScope, ReviewReconciler, ReviewStats};
use review_store::adapters::{from_primary, to_legacy};
use review_store::{
    LegacyStore, MovieId, MovieMetadataCache, PrimaryReviewRow, PrimaryStore, Review,
    SeededStores, Sentiment, Votes, MAX_STARS, MIN_STARS,
};
use sentiment_client::{GrpcClassificationBackend, SentimentClassifier};
use text_pipeline::{
    summarize_with_threshold, ModerationGate, ModerationReport, ProfanityFilter, TermListSpamChecker,
};

use crate::actor::Actor;
use crate::config::ServiceConfig;
use crate::enrichment::{EnrichmentEvent, EnrichmentPipeline, EnrichmentReport};
use crate::error::{Result, ValidationError};
use crate::ledger::InteractionLedger;

/// The stores the orchestrator works against
#[derive(Clone)]
pub struct ReviewStores {
    pub primary: Arc<dyn PrimaryStore>,
    pub legacy: Arc<dyn LegacyStore>,
    pub metadata: Arc<dyn MovieMetadataCache>,
}

impl From<SeededStores> for ReviewStores {
    fn from(stores: SeededStores) -> Self {
        Self {
            primary: stores.primary,
            legacy: stores.legacy,
            metadata: stores.metadata,
        }
    }
}

/// A new review as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub movie_id: MovieId,
    pub stars: u8,
    pub text: String,
}

/// What happened to a submission, so the caller can warn the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub review: Review,
    /// Profanity was masked before storing
    pub text_altered: bool,
    pub masked_words: Vec<String>,
    /// The spam check matched; the review is stored anyway
    pub spam_flagged: bool,
    pub spam_words: Vec<String>,
    /// The best-effort legacy copy was written
    pub legacy_replicated: bool,
}

/// Main orchestrator for the review lifecycle
#[derive(Clone)]
pub struct ReviewOrchestrator {
    stores: ReviewStores,
    reconciler: ReviewReconciler,
    dedup: DedupSweep,
    ledger: InteractionLedger,
    gate: Arc<ModerationGate>,
    classifier: SentimentClassifier,
    enrichment: EnrichmentPipeline,
    config: ServiceConfig,
}

impl ReviewOrchestrator {
    /// Assemble from ready-made components. Timeouts and batch settings in
    /// `config` are applied to the classifier, gate and enrichment pipeline.
    pub fn new(
        stores: ReviewStores,
        classifier: SentimentClassifier,
        gate: ModerationGate,
        config: ServiceConfig,
    ) -> Self {
        let classifier = classifier
            .with_inline_timeout(config.inline_timeout)
            .with_background_timeout(config.background_timeout);
        let gate = gate.with_spam_timeout(config.spam_check_timeout);
        let enrichment = EnrichmentPipeline::new(classifier.clone())
            .with_batch_size(config.enrichment_batch_size)
            .with_batch_pause(config.batch_pause);

        Self {
            reconciler: ReviewReconciler::new(stores.primary.clone(), stores.legacy.clone()),
            dedup: DedupSweep::new(stores.primary.clone()),
            ledger: InteractionLedger::new(stores.primary.clone()),
            gate: Arc::new(gate),
            classifier,
            enrichment,
            stores,
            config,
        }
    }

    /// Build every component from `config`.
    ///
    /// The classifier channel connects lazily, so an unreachable model
    /// service only means fallback sentiment, never a startup failure.
    pub fn from_config(stores: ReviewStores, config: ServiceConfig) -> anyhow::Result<Self> {
        let profanity = ProfanityFilter::new(&config.denylist).context("Invalid profanity denylist")?;
        let spam = TermListSpamChecker::new(&config.spam_terms).context("Invalid spam term list")?;
        let backend = GrpcClassificationBackend::connect_lazy(config.classifier_addr.clone())
            .context("Invalid classifier address")?;
        info!("Sentiment classifier at {}", backend.service_address());

        let gate = ModerationGate::new(profanity, Arc::new(spam));
        let classifier = SentimentClassifier::new(Arc::new(backend));
        Ok(Self::new(stores, classifier, gate, config))
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Accept a new review.
    ///
    /// Every validation failure is returned before anything is written.
    #[instrument(skip(self, actor, request), fields(movie_id = request.movie_id))]
    pub async fn submit(&self, actor: &Actor, request: SubmitRequest) -> Result<SubmitOutcome> {
        let start_time = Instant::now();

        let (author_id, author_name) = actor.require_user("write a review")?;
        validate_submission(&request)?;
        self.ensure_not_reviewed(author_id, request.movie_id).await?;

        let moderation = self.gate.moderate(&request.text).await;
        if moderation.spam.is_abusive {
            warn!(
                "Review from {} matched spam terms {:?}; storing anyway",
                author_id, moderation.spam.found_words
            );
        }

        let text = moderation.cleaned_text().to_string();
        let sentiment = self.classifier.classify_inline(&text).await;

        let row = PrimaryReviewRow {
            id: Uuid::new_v4().to_string(),
            movie_id: request.movie_id,
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            stars: request.stars,
            text,
            sentiment: Some(sentiment.label),
            confidence: Some(sentiment.confidence),
            liked_by: Default::default(),
            disliked_by: Default::default(),
            like_count: 0,
            dislike_count: 0,
            created_at: Utc::now(),
        };

        if let Err(e) = self.stores.primary.insert(row.clone()).await {
            error!("Primary store write failed: {}", e);
            return Err(e.into());
        }
        let review = from_primary(row);

        let legacy_replicated = match self.stores.legacy.insert(to_legacy(&review)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Legacy store write failed for review {}: {}", review.id, e);
                false
            }
        };

        info!(
            "Stored review {} for movie {} ({}, {}%) in {:.2?}",
            review.id,
            review.movie_id,
            sentiment.label,
            sentiment.confidence,
            start_time.elapsed()
        );

        Ok(SubmitOutcome {
            text_altered: moderation.text_altered(),
            masked_words: moderation.profanity.found_words,
            spam_flagged: moderation.spam.is_abusive,
            spam_words: moderation.spam.found_words,
            legacy_replicated,
            review,
        })
    }

    async fn ensure_not_reviewed(&self, author_id: &str, movie_id: MovieId) -> Result<()> {
        let existing = self.stores.primary.fetch_by_author(author_id).await?;
        if existing.iter().any(|row| row.movie_id == movie_id) {
            return Err(ValidationError::DuplicateSubmission { movie_id }.into());
        }
        Ok(())
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Merged newest-first reviews for a movie or an author
    pub async fn load_reviews(&self, scope: &ReconcileScope) -> Result<Vec<Review>> {
        Ok(self.reconciler.reconcile(scope).await?)
    }

    /// Backfill sentiment on already loaded reviews
    pub async fn enrich(
        &self,
        reviews: &mut [Review],
        cancel: &CancellationToken,
        events: Option<&mpsc::Sender<EnrichmentEvent>>,
    ) -> EnrichmentReport {
        self.enrichment.run(reviews, cancel, events).await
    }

    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn stats(&self, scope: &ReconcileScope) -> Result<ReviewStats> {
        let reviews = self.load_reviews(scope).await?;
        Ok(compute_stats(&reviews))
    }

    /// Title from the metadata cache, if the movie is known
    pub fn movie_title(&self, movie_id: MovieId) -> Option<String> {
        self.stores.metadata.get(movie_id).map(|movie| movie.title)
    }

    // ========================================================================
    // Votes and maintenance
    // ========================================================================

    pub async fn like(&self, actor: &Actor, review_id: &str) -> Result<Votes> {
        self.ledger.like(review_id, actor).await
    }

    pub async fn dislike(&self, actor: &Actor, review_id: &str) -> Result<Votes> {
        self.ledger.dislike(review_id, actor).await
    }

    pub async fn dedup(&self, movie_id: MovieId) -> Result<DedupReport> {
        Ok(self.dedup.run(movie_id).await?)
    }

    // ========================================================================
    // Text utilities
    // ========================================================================

    pub async fn moderate(&self, text: &str) -> ModerationReport {
        self.gate.moderate(text).await
    }

    pub async fn classify(&self, text: &str) -> Sentiment {
        self.classifier.classify_inline(text).await
    }

    /// First and last sentence of long text; short text unchanged
    pub fn summarize(&self, text: &str) -> String {
        summarize_with_threshold(text, self.config.summary_threshold)
    }
}

fn validate_submission(request: &SubmitRequest) -> std::result::Result<(), ValidationError> {
    if !(MIN_STARS..=MAX_STARS).contains(&request.stars) {
        return Err(ValidationError::StarsOutOfRange(request.stars));
    }
    if request.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReviewError;
    use async_trait::async_trait;
    use review_store::{
        InMemoryLegacyStore, InMemoryMetadataCache, InMemoryPrimaryStore, LegacyReviewRow,
        MovieMetadata, SentimentLabel, SourceStore, StoreError,
    };
    use sentiment_client::sentiment::sentiment_service_server::{
        SentimentService, SentimentServiceServer,
    };
    use sentiment_client::sentiment::{ClassifyRequest, ClassifyResponse};
    use sentiment_client::FALLBACK_SENTIMENT;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tonic::{Request, Response, Status};

    // ============================================================================
    // Mock classification service
    // ============================================================================

    /// Answers POSITIVE for "great", NEGATIVE for "awful", NEUTRAL otherwise
    #[derive(Default)]
    struct MockSentimentService;

    #[tonic::async_trait]
    impl SentimentService for MockSentimentService {
        async fn classify(
            &self,
            request: Request<ClassifyRequest>,
        ) -> std::result::Result<Response<ClassifyResponse>, Status> {
            let text = request.get_ref().text.to_lowercase();
            let label = if text.contains("great") {
                "POSITIVE"
            } else if text.contains("awful") {
                "NEGATIVE"
            } else {
                "NEUTRAL"
            };
            Ok(Response::new(ClassifyResponse {
                label: label.to_string(),
                score: 0.93,
            }))
        }
    }

    async fn start_mock_service() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock classification service");
        let addr = listener.local_addr().expect("Failed to get local address");
        let service = SentimentServiceServer::new(MockSentimentService);

        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("Mock classification service failed");
        });

        (format!("http://{}", addr), handle)
    }

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    struct Fixture {
        orchestrator: ReviewOrchestrator,
        primary: Arc<InMemoryPrimaryStore>,
        legacy: Arc<InMemoryLegacyStore>,
    }

    fn fresh_stores() -> (Arc<InMemoryPrimaryStore>, Arc<InMemoryLegacyStore>, Arc<InMemoryMetadataCache>) {
        let metadata = InMemoryMetadataCache::with_movies(vec![MovieMetadata {
            id: 1,
            title: "The Matrix (1999)".to_string(),
            year: Some(1999),
            genres: vec!["Action".to_string()],
        }]);
        (
            Arc::new(InMemoryPrimaryStore::new()),
            Arc::new(InMemoryLegacyStore::with_rows(vec![LegacyReviewRow {
                movie_id: 1,
                user_id: None,
                user_name: None,
                rating: 3.0,
                review_text: "An old review with no sentiment".to_string(),
                sentiment: None,
                score: None,
                timestamp_ms: 1_000,
            }])),
            Arc::new(metadata),
        )
    }

    fn test_config(addr: String) -> ServiceConfig {
        ServiceConfig::default()
            .with_classifier_addr(addr)
            .with_inline_timeout(Duration::from_secs(2))
            .with_background_timeout(Duration::from_secs(2))
            .with_batch_pause(Duration::ZERO)
    }

    async fn build_fixture() -> (Fixture, tokio::task::JoinHandle<()>) {
        let (addr, handle) = start_mock_service().await;
        let (primary, legacy, metadata) = fresh_stores();
        let stores = ReviewStores {
            primary: primary.clone(),
            legacy: legacy.clone(),
            metadata,
        };
        let orchestrator = ReviewOrchestrator::from_config(stores, test_config(addr))
            .expect("Failed to create orchestrator");
        (
            Fixture {
                orchestrator,
                primary,
                legacy,
            },
            handle,
        )
    }

    fn request(stars: u8, text: &str) -> SubmitRequest {
        SubmitRequest {
            movie_id: 1,
            stars,
            text: text.to_string(),
        }
    }

    fn neo() -> Actor {
        Actor::user("neo", "Neo")
    }

    /// Legacy store that refuses every write
    struct ReadOnlyLegacy;

    #[async_trait]
    impl LegacyStore for ReadOnlyLegacy {
        async fn fetch_by_movie(&self, _: MovieId) -> review_store::Result<Vec<LegacyReviewRow>> {
            Ok(vec![])
        }
        async fn fetch_by_author(&self, _: &str) -> review_store::Result<Vec<LegacyReviewRow>> {
            Ok(vec![])
        }
        async fn insert(&self, _: LegacyReviewRow) -> review_store::Result<()> {
            Err(StoreError::Unavailable {
                store: "legacy",
                reason: "read-only replica".to_string(),
            })
        }
    }

    // ============================================================================
    // Submission
    // ============================================================================

    #[tokio::test]
    async fn test_submit_writes_both_stores() {
        let (fx, handle) = build_fixture().await;

        let outcome = fx
            .orchestrator
            .submit(&neo(), request(5, "A great film"))
            .await
            .expect("submit failed");

        assert!(outcome.legacy_replicated);
        assert!(!outcome.text_altered);
        assert_eq!(outcome.review.sentiment_label(), Some(SentimentLabel::Positive));
        assert_eq!(outcome.review.sentiment_confidence(), Some(93));
        assert_eq!(fx.primary.len().await, 1);
        assert_eq!(fx.legacy.len().await, 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_submit_masks_profanity() {
        let (fx, handle) = build_fixture().await;

        let outcome = fx
            .orchestrator
            .submit(&neo(), request(2, "What a damn awful ending"))
            .await
            .unwrap();

        assert!(outcome.text_altered);
        assert_eq!(outcome.masked_words, vec!["damn"]);
        assert_eq!(outcome.review.text, "What a **** awful ending");

        handle.abort();
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let (fx, handle) = build_fixture().await;
        let cases = vec![
            (Actor::Anonymous, request(4, "fine")),
            (neo(), request(0, "fine")),
            (neo(), request(6, "fine")),
            (neo(), request(3, "   ")),
        ];

        for (actor, req) in cases {
            let result = fx.orchestrator.submit(&actor, req).await;
            assert!(
                matches!(result, Err(ReviewError::Validation(_))),
                "expected validation error, got {:?}",
                result.map(|o| o.review.id)
            );
        }
        assert!(fx.primary.is_empty().await);
        assert_eq!(fx.legacy.len().await, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_second_submission_for_same_movie_rejected() {
        let (fx, handle) = build_fixture().await;

        fx.orchestrator.submit(&neo(), request(4, "great")).await.unwrap();
        let second = fx.orchestrator.submit(&neo(), request(1, "awful")).await;

        assert!(matches!(
            second,
            Err(ReviewError::Validation(ValidationError::DuplicateSubmission { movie_id: 1 }))
        ));
        assert_eq!(fx.primary.len().await, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_classifier_down_uses_fallback() {
        let (primary, legacy, metadata) = fresh_stores();
        let stores = ReviewStores {
            primary,
            legacy,
            metadata,
        };
        // Nothing listens on port 1
        let config = test_config("http://127.0.0.1:1".to_string());
        let orchestrator = ReviewOrchestrator::from_config(stores, config).unwrap();

        let outcome = orchestrator.submit(&neo(), request(3, "great")).await.unwrap();
        assert_eq!(outcome.review.sentiment, Some(FALLBACK_SENTIMENT));
    }

    #[tokio::test]
    async fn test_legacy_failure_is_not_fatal() {
        let (addr, handle) = start_mock_service().await;
        let (primary, _, metadata) = fresh_stores();
        let stores = ReviewStores {
            primary: primary.clone(),
            legacy: Arc::new(ReadOnlyLegacy),
            metadata,
        };
        let orchestrator = ReviewOrchestrator::from_config(stores, test_config(addr)).unwrap();

        let outcome = orchestrator.submit(&neo(), request(4, "great")).await.unwrap();
        assert!(!outcome.legacy_replicated);
        assert_eq!(primary.len().await, 1);

        handle.abort();
    }

    // ============================================================================
    // Load, enrich, stats
    // ============================================================================

    #[tokio::test]
    async fn test_load_then_enrich_legacy_rows() {
        let (fx, handle) = build_fixture().await;
        fx.orchestrator.submit(&neo(), request(5, "great")).await.unwrap();

        let mut reviews = fx
            .orchestrator
            .load_reviews(&ReconcileScope::Movie(1))
            .await
            .unwrap();
        // New review from both stores, then the seeded legacy row
        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[0].source_store, SourceStore::Primary);
        assert_eq!(reviews[1].source_store, SourceStore::Legacy);
        assert!(!reviews[1].needs_enrichment());
        assert!(reviews[2].needs_enrichment());

        let report = fx
            .orchestrator
            .enrich(&mut reviews, &CancellationToken::new(), None)
            .await;
        assert_eq!(report.pending, 1);
        assert_eq!(report.batches, 1);
        assert_eq!(reviews[2].sentiment_label(), Some(SentimentLabel::Neutral));
        assert_eq!(reviews[1].sentiment_label(), Some(SentimentLabel::Positive));

        handle.abort();
    }

    #[tokio::test]
    async fn test_stats_and_title() {
        let (fx, handle) = build_fixture().await;
        fx.orchestrator.submit(&neo(), request(5, "great")).await.unwrap();

        let stats = fx.orchestrator.stats(&ReconcileScope::Movie(1)).await.unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.rating_distribution, [0, 0, 1, 0, 2]);
        assert_eq!(fx.orchestrator.movie_title(1).as_deref(), Some("The Matrix (1999)"));
        assert_eq!(fx.orchestrator.movie_title(2), None);

        handle.abort();
    }

    #[tokio::test]
    async fn test_vote_on_submitted_review() {
        let (fx, handle) = build_fixture().await;
        let outcome = fx.orchestrator.submit(&neo(), request(5, "great")).await.unwrap();
        let trinity = Actor::user("trinity", "Trinity");

        let votes = fx.orchestrator.like(&trinity, &outcome.review.id).await.unwrap();
        assert_eq!(votes.like_count(), 1);
        let stored = fx.primary.get(&outcome.review.id).await.unwrap().unwrap();
        assert!(stored.liked_by.contains("trinity"));

        let rejected = fx.orchestrator.dislike(&trinity, &outcome.review.id).await;
        assert!(matches!(
            rejected,
            Err(ReviewError::Validation(ValidationError::AlreadyLiked))
        ));

        handle.abort();
    }
}
