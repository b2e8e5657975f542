//! # Enrichment Pipeline
//!
//! Backfills sentiment for reviews that are already on screen.
//!
//! ## Per-review state machine
//! `Pending` → `Analyzing` → `Done`. A classifier failure still ends in
//! `Done`, carrying the fallback sentiment.
//!
//! ## Batching
//! Pending reviews are split into batches (default 5). Calls within a batch
//! run concurrently and each review turns `Done` as soon as its own call
//! resolves; the next batch starts only after the whole batch has resolved,
//! followed by a short pause (default 100ms).
//!
//! ## Cancellation
//! The run is tied to a `CancellationToken`. Once it fires, no new batch
//! starts, the calls still in flight are abandoned, their reviews go back
//! to `Pending`, and no further events are emitted. Reviews that already
//! reached `Done` keep their sentiment.
//!
//! Rust concept: `tokio::select!` with `biased;`
//! Polls the cancellation branch first, so a cancelled token always wins
//! over a batch that happens to finish in the same poll.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use review_store::{EnrichmentState, Review, ReviewId, Sentiment};
use sentiment_client::SentimentClassifier;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(100);

/// One state transition of one review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentEvent {
    pub review_id: ReviewId,
    pub state: EnrichmentState,
    /// Set when `state` is `Done`
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Reviews that needed sentiment when the run started
    pub pending: usize,
    /// Batches that completed
    pub batches: usize,
    pub enriched: usize,
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct EnrichmentPipeline {
    classifier: SentimentClassifier,
    batch_size: usize,
    batch_pause: Duration,
}

impl EnrichmentPipeline {
    pub fn new(classifier: SentimentClassifier) -> Self {
        Self {
            classifier,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }

    /// Configure the batch size (default: 5, minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Configure the pause between batches (default: 100ms)
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Fill in sentiment for every review in `reviews` that lacks it.
    ///
    /// Reviews are updated in place. When `events` is given, every state
    /// transition is sent as it happens. Sends wait for channel capacity, so
    /// the receiver must be drained concurrently with the run (for example
    /// from a spawned task), not after it returns.
    #[instrument(skip_all, fields(reviews = reviews.len()))]
    pub async fn run(
        &self,
        reviews: &mut [Review],
        cancel: &CancellationToken,
        events: Option<&mpsc::Sender<EnrichmentEvent>>,
    ) -> EnrichmentReport {
        let pending: Vec<usize> = reviews
            .iter()
            .enumerate()
            .filter(|(_, review)| review.needs_enrichment())
            .map(|(i, _)| i)
            .collect();

        let mut report = EnrichmentReport {
            pending: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            debug!("Nothing to enrich");
            return report;
        }

        let total_batches = pending.len().div_ceil(self.batch_size);
        info!(
            "Enriching {} reviews in {} batches",
            pending.len(),
            total_batches
        );

        for (batch_no, batch) in pending.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            for &i in batch {
                reviews[i].enrichment_state = EnrichmentState::Analyzing;
                emit(events, &reviews[i]).await;
            }

            let classifier = &self.classifier;
            let mut calls: FuturesUnordered<_> = batch
                .iter()
                .map(|&i| {
                    let text = reviews[i].text.clone();
                    async move { (i, classifier.classify_background(&text).await) }
                })
                .collect();

            let mut interrupted = false;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        interrupted = true;
                        break;
                    }
                    next = calls.next() => next,
                };
                let Some((i, sentiment)) = next else { break };
                reviews[i].sentiment = Some(sentiment);
                reviews[i].enrichment_state = EnrichmentState::Done;
                report.enriched += 1;
                emit(events, &reviews[i]).await;
            }

            if interrupted {
                // Late results are discarded
                for &i in batch {
                    if reviews[i].enrichment_state == EnrichmentState::Analyzing {
                        reviews[i].enrichment_state = EnrichmentState::Pending;
                    }
                }
                report.cancelled = true;
                break;
            }
            report.batches += 1;
            debug!("Batch {}/{} done", batch_no + 1, total_batches);

            if batch_no + 1 < total_batches && !self.batch_pause.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.batch_pause) => {}
                }
            }
        }

        info!(
            "Enrichment finished: {} of {} reviews in {} batches{}",
            report.enriched,
            report.pending,
            report.batches,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }
}

async fn emit(events: Option<&mpsc::Sender<EnrichmentEvent>>, review: &Review) {
    let Some(tx) = events else { return };
    let event = EnrichmentEvent {
        review_id: review.id.clone(),
        state: review.enrichment_state,
        sentiment: review.sentiment,
    };
    if tx.send(event).await.is_err() {
        debug!("Enrichment event receiver dropped");
    }
}
