//! Sentiment classification client for the external gRPC model service.
//!
//! This crate provides:
//! - A gRPC backend talking to the `SentimentService` model server
//! - Label normalization from heterogeneous model vocabularies
//! - A [`SentimentClassifier`] that bounds every call with a timeout and
//!   falls back to a fixed neutral result on any failure
//!
//! Classification never fails from the caller's point of view: the
//! submission path and the enrichment pipeline both get a [`Sentiment`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use review_store::{Sentiment, SentimentLabel};
use thiserror::Error;
use tonic::transport::Channel;
use tracing::{debug, error, info, warn};

// Include the generated protobuf code
pub mod sentiment {
    tonic::include_proto!("sentiment");
}

use sentiment::{sentiment_service_client::SentimentServiceClient, ClassifyRequest};

/// Result returned whenever classification fails or times out
pub const FALLBACK_SENTIMENT: Sentiment = Sentiment {
    label: SentimentLabel::Neutral,
    confidence: 45,
};

/// Upper bound for the classification call made while submitting a review
pub const DEFAULT_INLINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-item bound for background enrichment calls
pub const DEFAULT_BACKGROUND_TIMEOUT: Duration = Duration::from_secs(8);

/// Errors that can occur when interacting with the classification service
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to connect to classification service: {0}")]
    ConnectionError(String),

    #[error("Failed to classify text: {0}")]
    ClassificationError(String),

    #[error("Invalid response from classification service: {0}")]
    InvalidResponse(String),

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),
}

/// Model output before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub score: f32,
}

/// Anything that can turn text into a raw model prediction.
///
/// The gRPC client is the production implementation; the seam exists so the
/// classifier's timeout and fallback rules apply to any transport.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    async fn predict(&self, text: &str) -> Result<RawPrediction, ClassifierError>;
}

/// gRPC transport to the model service.
///
/// Tonic channels are cheap to clone and multiplex requests, so each call
/// clones the client instead of requiring `&mut self`.
#[derive(Clone)]
pub struct GrpcClassificationBackend {
    client: SentimentServiceClient<Channel>,
    service_addr: String,
}

impl GrpcClassificationBackend {
    /// Connect to the classification service, failing if it is unreachable.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50052")
    pub async fn connect(addr: impl Into<String>) -> Result<Self, ClassifierError> {
        let addr = addr.into();
        info!("Connecting to classification service at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .map_err(|e| ClassifierError::ConnectionError(e.to_string()))?
            .connect()
            .await
            .map_err(|e| ClassifierError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client: SentimentServiceClient::new(channel),
            service_addr: addr,
        })
    }

    /// Create a client that connects on first use.
    ///
    /// Submission must not depend on the model service being up, so the
    /// service wiring uses this constructor; an unreachable service then
    /// surfaces as a per-call error and the fallback sentiment.
    pub fn connect_lazy(addr: impl Into<String>) -> Result<Self, ClassifierError> {
        let addr = addr.into();
        debug!("Configuring lazy channel to classification service at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .map_err(|e| ClassifierError::ConnectionError(e.to_string()))?
            .connect_lazy();

        Ok(Self {
            client: SentimentServiceClient::new(channel),
            service_addr: addr,
        })
    }

    /// Get the address of the service this client talks to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

#[async_trait]
impl ClassificationBackend for GrpcClassificationBackend {
    async fn predict(&self, text: &str) -> Result<RawPrediction, ClassifierError> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(ClassifyRequest {
            text: text.to_string(),
        });

        let response = client.classify(request).await.map_err(|status| {
            error!("gRPC error while classifying text: {}", status);
            ClassifierError::ClassificationError(status.to_string())
        })?;

        let body = response.into_inner();
        Ok(RawPrediction {
            label: body.label,
            score: body.score,
        })
    }
}

/// Normalize a raw prediction into one of the three sentiment classes.
///
/// Scores in 0.0..=1.0 are treated as probabilities, anything above as a
/// percentage. Unknown labels and non-finite or negative scores are invalid.
pub fn normalize_prediction(prediction: &RawPrediction) -> Result<Sentiment, ClassifierError> {
    let label = SentimentLabel::normalize(&prediction.label).ok_or_else(|| {
        ClassifierError::InvalidResponse(format!("unknown label '{}'", prediction.label))
    })?;

    let score = prediction.score;
    if !score.is_finite() || score < 0.0 {
        return Err(ClassifierError::InvalidResponse(format!(
            "score out of range: {}",
            score
        )));
    }
    let percent = if score <= 1.0 { score * 100.0 } else { score };
    Ok(Sentiment::new(label, percent.round().min(100.0) as u8))
}

/// Timeout-bounded classifier with a deterministic fallback.
#[derive(Clone)]
pub struct SentimentClassifier {
    backend: Arc<dyn ClassificationBackend>,
    inline_timeout: Duration,
    background_timeout: Duration,
}

impl SentimentClassifier {
    pub fn new(backend: Arc<dyn ClassificationBackend>) -> Self {
        Self {
            backend,
            inline_timeout: DEFAULT_INLINE_TIMEOUT,
            background_timeout: DEFAULT_BACKGROUND_TIMEOUT,
        }
    }

    /// Configure the submission-path timeout (default: 30s)
    pub fn with_inline_timeout(mut self, timeout: Duration) -> Self {
        self.inline_timeout = timeout;
        self
    }

    /// Configure the per-item enrichment timeout (default: 8s)
    pub fn with_background_timeout(mut self, timeout: Duration) -> Self {
        self.background_timeout = timeout;
        self
    }

    /// Classify on the submission path
    pub async fn classify_inline(&self, text: &str) -> Sentiment {
        self.classify(text, self.inline_timeout).await
    }

    /// Classify one item of a background enrichment batch
    pub async fn classify_background(&self, text: &str) -> Sentiment {
        self.classify(text, self.background_timeout).await
    }

    /// Classify text, returning [`FALLBACK_SENTIMENT`] on any failure.
    pub async fn classify(&self, text: &str, timeout: Duration) -> Sentiment {
        match self.try_classify(text, timeout).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!("Sentiment classification failed, using fallback: {}", e);
                FALLBACK_SENTIMENT
            }
        }
    }

    /// Classify text, surfacing the failure instead of falling back.
    pub async fn try_classify(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Sentiment, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::InvalidResponse(
                "refusing to classify empty text".to_string(),
            ));
        }

        let prediction = tokio::time::timeout(timeout, self.backend.predict(text))
            .await
            .map_err(|_| ClassifierError::Timeout(timeout))??;

        let sentiment = normalize_prediction(&prediction)?;
        debug!(
            "Classified text as {} ({}%)",
            sentiment.label, sentiment.confidence
        );
        Ok(sentiment)
    }
}
