//! Ordered provider fallback.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::Provider;

/// Generation modality, used for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Speech,
    Image,
    Video,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Speech => "speech",
            Modality::Image => "image",
            Modality::Video => "video",
        }
    }
}

/// How far down the chain a failure may fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Try every provider in order.
    Exhaustive,
    /// Try the first provider, then at most one fallback.
    SingleHop,
}

impl FallbackPolicy {
    fn max_attempts(&self, providers: usize) -> usize {
        match self {
            FallbackPolicy::Exhaustive => providers,
            FallbackPolicy::SingleHop => providers.min(2),
        }
    }
}

/// Value produced by the provider that succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSuccess<T> {
    pub value: T,
    pub provider: &'static str,
}

/// An ordered list of interchangeable providers for one modality.
///
/// At call time providers with credentials are moved ahead of those
/// without, keeping relative order within each group. A provider
/// without credentials still consumes an attempt but is never called.
pub struct FallbackChain<P: ?Sized + Provider> {
    modality: Modality,
    policy: FallbackPolicy,
    providers: Vec<Arc<P>>,
}

impl<P: ?Sized + Provider> Clone for FallbackChain<P> {
    fn clone(&self) -> Self {
        Self {
            modality: self.modality,
            policy: self.policy,
            providers: self.providers.clone(),
        }
    }
}

impl<P: ?Sized + Provider> FallbackChain<P> {
    pub fn new(modality: Modality, policy: FallbackPolicy) -> Self {
        Self {
            modality,
            policy,
            providers: Vec::new(),
        }
    }

    /// Append a provider at the lowest priority.
    pub fn with(mut self, provider: Arc<P>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in effective attempt order.
    pub fn attempt_order(&self) -> Vec<&'static str> {
        let ordered = self.ordered();
        let limit = self.policy.max_attempts(ordered.len());
        ordered.iter().take(limit).map(|p| p.name()).collect()
    }

    fn ordered(&self) -> Vec<Arc<P>> {
        let (ready, missing): (Vec<_>, Vec<_>) = self
            .providers
            .iter()
            .cloned()
            .partition(|p| p.has_credentials());
        ready.into_iter().chain(missing).collect()
    }

    /// Run `op` against providers in order until one succeeds.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> ProviderResult<ChainSuccess<T>>
    where
        F: FnMut(Arc<P>) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let modality = self.modality.as_str();
        let ordered = self.ordered();
        let limit = self.policy.max_attempts(ordered.len());
        let mut attempts = 0u32;
        let mut last_error: Option<ProviderError> = None;

        for provider in ordered.into_iter().take(limit) {
            let name = provider.name();
            attempts += 1;

            if !provider.has_credentials() {
                debug!(modality, provider = name, "Skipping provider without credentials");
                last_error = Some(ProviderError::MissingCredentials { provider: name });
                continue;
            }

            if attempts > 1 {
                info!(modality, provider = name, "Falling back to next provider");
            }

            match op(provider).await {
                Ok(value) => {
                    metrics::counter!(
                        "reel_provider_requests_total",
                        "modality" => modality,
                        "provider" => name,
                        "outcome" => "success"
                    )
                    .increment(1);
                    info!(modality, provider = name, "Provider succeeded");
                    return Ok(ChainSuccess {
                        value,
                        provider: name,
                    });
                }
                Err(e) => {
                    metrics::counter!(
                        "reel_provider_requests_total",
                        "modality" => modality,
                        "provider" => name,
                        "outcome" => "failure"
                    )
                    .increment(1);
                    warn!(modality, provider = name, "Provider failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(ProviderError::Exhausted {
            modality,
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no providers configured".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fake {
        name: &'static str,
        keyed: bool,
        fails: bool,
    }

    impl Provider for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn has_credentials(&self) -> bool {
            self.keyed
        }
    }

    fn fake(name: &'static str, keyed: bool, fails: bool) -> Arc<Fake> {
        Arc::new(Fake { name, keyed, fails })
    }

    async fn call(chain: &FallbackChain<Fake>, calls: &Mutex<Vec<&'static str>>) -> ProviderResult<ChainSuccess<&'static str>> {
        chain
            .run(move |p| async move {
                calls.lock().unwrap().push(p.name);
                if p.fails {
                    Err(ProviderError::job_failed(p.name, "boom"))
                } else {
                    Ok(p.name)
                }
            })
            .await
    }

    #[tokio::test]
    async fn test_exhaustive_falls_through_to_keyless() {
        let chain = FallbackChain::new(Modality::Image, FallbackPolicy::Exhaustive)
            .with(fake("krea", true, true))
            .with(fake("nanobanana", false, false))
            .with(fake("pollinations", true, false));

        let calls = Mutex::new(Vec::new());
        let success = call(&chain, &calls).await.unwrap();

        assert_eq!(success.provider, "pollinations");
        assert_eq!(*calls.lock().unwrap(), vec!["krea", "pollinations"]);
    }

    #[tokio::test]
    async fn test_credential_aware_reordering() {
        let chain = FallbackChain::new(Modality::Video, FallbackPolicy::SingleHop)
            .with(fake("krea", false, false))
            .with(fake("runway", true, false));

        assert_eq!(chain.attempt_order(), vec!["runway", "krea"]);

        let calls = Mutex::new(Vec::new());
        assert_eq!(call(&chain, &calls).await.unwrap().provider, "runway");
    }

    #[tokio::test]
    async fn test_single_hop_stops_after_one_fallback() {
        let chain = FallbackChain::new(Modality::Video, FallbackPolicy::SingleHop)
            .with(fake("a", true, true))
            .with(fake("b", true, true))
            .with(fake("c", true, false));

        let calls = Mutex::new(Vec::new());
        let err = call(&chain, &calls).await.unwrap_err();

        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
        assert!(matches!(
            err,
            ProviderError::Exhausted { modality: "video", attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let chain: FallbackChain<Fake> = FallbackChain::new(Modality::Image, FallbackPolicy::Exhaustive);
        let calls = Mutex::new(Vec::new());
        let err = call(&chain, &calls).await.unwrap_err();
        assert!(matches!(err, ProviderError::Exhausted { attempts: 0, .. }));
    }
}
