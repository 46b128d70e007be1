use crate::model::{Candidate, DiscoveryQuery, ProviderError};

/// A pluggable geographic search backend. The pipeline queries providers in
/// ranked order and stops once `limit` candidates have accumulated. A disabled
/// provider (missing credentials) is skipped silently.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<Candidate>, ProviderError>;
}
