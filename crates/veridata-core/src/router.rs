//! Fetch router: dispatches structured requests to domain resolvers.
//!
//! One resolver per [`DataType`]; each resolver normalizes, resolves scope,
//! consults the TTL cache, and shapes its output into the common envelope.
//! Resolvers encode every failure as `error_message` and never return `Err`
//! to the router.

use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::shared::{DataType, VerifiableDataRequest, VerifiableDataResponse};

/// Trait implemented by all domain resolvers.
#[async_trait::async_trait]
pub trait DataResolver: Send + Sync {
    /// Domain this resolver answers for.
    fn data_type(&self) -> DataType;

    /// Resolves the request into an envelope. `timestamp` is the fetch time
    /// stamped by the router so all envelopes in a dispatch agree.
    async fn fetch(
        &self,
        request: &VerifiableDataRequest,
        timestamp: &str,
    ) -> VerifiableDataResponse;
}

/// Registry of domain resolvers keyed by data type.
pub struct ResolverRegistry {
    resolvers: HashMap<DataType, Arc<dyn DataResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    pub fn register(&mut self, resolver: Arc<dyn DataResolver>) {
        self.resolvers.insert(resolver.data_type(), resolver);
    }

    pub fn get(&self, data_type: DataType) -> Option<Arc<dyn DataResolver>> {
        self.resolvers.get(&data_type).cloned()
    }

    /// Registered domains (for discovery and health reporting).
    pub fn registered_types(&self) -> Vec<DataType> {
        self.resolvers.keys().copied().collect()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches on `data_type` (case-insensitive) and uniformly shapes
/// domain-specific output into the response envelope.
pub struct FetchRouter {
    registry: Arc<ResolverRegistry>,
}

impl FetchRouter {
    pub fn new(registry: Arc<ResolverRegistry>) -> Self {
        Self { registry }
    }

    pub async fn route(&self, request: &VerifiableDataRequest) -> VerifiableDataResponse {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let resolver = match request.data_type.parse::<DataType>() {
            Ok(data_type) => self.registry.get(data_type),
            Err(()) => None,
        };

        match resolver {
            Some(resolver) => {
                info!(
                    session_id = %request.session_id,
                    data_type = %resolver.data_type(),
                    identifier = %request.identifier,
                    "dispatching fetch"
                );
                resolver.fetch(request, &timestamp).await
            }
            None => {
                warn!(
                    session_id = %request.session_id,
                    data_type = %request.data_type,
                    "unsupported data_type"
                );
                Self::unsupported(request, &timestamp)
            }
        }
    }

    fn unsupported(request: &VerifiableDataRequest, timestamp: &str) -> VerifiableDataResponse {
        VerifiableDataResponse::failure(
            request,
            &request.data_type,
            "Data Handler System",
            timestamp,
            "Data type not supported by this handler.",
            FetchError::UnsupportedType(request.data_type.clone()).to_string(),
        )
    }
}
