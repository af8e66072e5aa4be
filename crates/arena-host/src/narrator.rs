//! Narrators turn a computed round into display text
//!
//! A narrator may be slow or unavailable. [`narrate_or_fallback`] bounds it
//! with a timeout and substitutes the deterministic template text on any
//! failure, so narration never blocks or fails a round.

use std::{future::Future, time::Duration};

use arena_logic::{fallback_narration, Narration, NarrationRequest};
use reqwest::Client as HttpClient;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::NarratorTarget;

#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("narrator unavailable: {0}")]
    Unavailable(String),
}

pub trait Narrator: Send + Sync {
    fn narrate(
        &self,
        request: &NarrationRequest,
    ) -> impl Future<Output = Result<Narration, NarratorError>> + Send;
}

/// Template text from the core. Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateNarrator;

impl Narrator for TemplateNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, NarratorError> {
        Ok(fallback_narration(request))
    }
}

/// POSTs the request as JSON and expects a [`Narration`] back
#[derive(Clone)]
pub struct HttpNarrator {
    endpoint: Url,
    http_client: HttpClient,
}

impl HttpNarrator {
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, NarratorError> {
        let http_client = HttpClient::builder().timeout(request_timeout).build()?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }
}

impl Narrator for HttpNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, NarratorError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NarratorError::Failed(response.status()));
        }
        Ok(response.json::<Narration>().await?)
    }
}

/// Narrator chosen by configuration
#[derive(Clone)]
pub enum ConfiguredNarrator {
    Template(TemplateNarrator),
    Http(HttpNarrator),
}

impl ConfiguredNarrator {
    pub fn from_target(target: &NarratorTarget, request_timeout: Duration) -> Result<Self, NarratorError> {
        Ok(match target {
            NarratorTarget::Template => ConfiguredNarrator::Template(TemplateNarrator),
            NarratorTarget::Http(endpoint) => {
                ConfiguredNarrator::Http(HttpNarrator::new(endpoint.clone(), request_timeout)?)
            }
        })
    }
}

impl Narrator for ConfiguredNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, NarratorError> {
        match self {
            ConfiguredNarrator::Template(n) => n.narrate(request).await,
            ConfiguredNarrator::Http(n) => n.narrate(request).await,
        }
    }
}

/// Ask `narrator` for text, falling back to the template on error,
/// timeout or empty output.
pub async fn narrate_or_fallback<N: Narrator>(
    narrator: &N,
    request: &NarrationRequest,
    limit: Duration,
) -> Narration {
    let round = request.round_number;
    match timeout(limit, narrator.narrate(request)).await {
        Ok(Ok(narration)) if !narration.is_empty() => {
            debug!(round, lines = narration.lines().len(), "narration received");
            narration
        }
        Ok(Ok(_)) => {
            warn!(round, "narrator returned nothing, using fallback");
            fallback_narration(request)
        }
        Ok(Err(e)) => {
            warn!(round, error = %e, "narrator failed, using fallback");
            fallback_narration(request)
        }
        Err(_) => {
            warn!(round, timeout_ms = limit.as_millis() as u64, "narrator timed out, using fallback");
            fallback_narration(request)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arena_logic::{ContestantSummary, RoundType};

    pub(crate) struct FailingNarrator;

    impl Narrator for FailingNarrator {
        async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, NarratorError> {
            Err(NarratorError::Unavailable("offline".into()))
        }
    }

    pub(crate) struct SlowNarrator;

    impl Narrator for SlowNarrator {
        async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, NarratorError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Narration {
                setup_lines: vec!["too late".into()],
                ..Default::default()
            })
        }
    }

    pub(crate) struct FixedNarrator(pub Narration);

    impl Narrator for FixedNarrator {
        async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, NarratorError> {
            Ok(self.0.clone())
        }
    }

    fn request() -> NarrationRequest {
        NarrationRequest {
            round_type: RoundType::TugOfWar,
            round_number: 2,
            contestants: Vec::<ContestantSummary>::new(),
            survivors: vec![],
            eliminated: vec![],
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let narration = narrate_or_fallback(&FailingNarrator, &request(), Duration::from_secs(1)).await;
        assert_eq!(narration, fallback_narration(&request()));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let narration = narrate_or_fallback(&SlowNarrator, &request(), Duration::from_millis(20)).await;
        assert_eq!(narration, fallback_narration(&request()));
    }

    #[tokio::test]
    async fn test_empty_output_falls_back() {
        let narrator = FixedNarrator(Narration::default());
        let narration = narrate_or_fallback(&narrator, &request(), Duration::from_secs(1)).await;
        assert_eq!(narration, fallback_narration(&request()));
    }

    #[tokio::test]
    async fn test_narrator_output_is_kept() {
        let custom = Narration {
            dramatic_lines: vec!["The rope snaps.".into()],
            ..Default::default()
        };
        let narrator = FixedNarrator(custom.clone());
        let narration = narrate_or_fallback(&narrator, &request(), Duration::from_secs(1)).await;
        assert_eq!(narration, custom);
    }

    #[tokio::test]
    async fn test_unreachable_http_narrator_falls_back() {
        let endpoint = Url::parse("http://127.0.0.1:9/narrate").unwrap();
        let narrator = HttpNarrator::new(endpoint, Duration::from_millis(200)).unwrap();
        let narration = narrate_or_fallback(&narrator, &request(), Duration::from_secs(2)).await;
        assert_eq!(narration, fallback_narration(&request()));
    }
}
