//! veridata-resolvers: one resolver per supported data domain.
//!
//! Four domains answer from static reference tables; crypto price is the one
//! live-upstream path. All share the core's TTL cache and plug into the fetch
//! router via [`standard_registry`].

mod carbon_footprint;
mod crypto_price;
mod education_credential;
mod reputation_score;
mod supply_chain;

pub use carbon_footprint::{CarbonFootprintResolver, CarbonScope};
pub use crypto_price::CryptoPriceResolver;
pub use education_credential::EducationCredentialResolver;
pub use reputation_score::{ReputationAspect, ReputationScoreResolver};
pub use supply_chain::SupplyChainResolver;

use std::sync::Arc;
use veridata_core::{ResolverRegistry, TtlCache};

/// Registry with all five domain resolvers sharing one cache.
pub fn standard_registry(cache: Arc<TtlCache>, price_api_url: &str) -> ResolverRegistry {
    let mut registry = ResolverRegistry::new();
    registry.register(Arc::new(CryptoPriceResolver::new(
        price_api_url,
        Arc::clone(&cache),
    )));
    registry.register(Arc::new(EducationCredentialResolver::new(Arc::clone(&cache))));
    registry.register(Arc::new(SupplyChainResolver::new(Arc::clone(&cache))));
    registry.register(Arc::new(CarbonFootprintResolver::new(Arc::clone(&cache))));
    registry.register(Arc::new(ReputationScoreResolver::new(cache)));
    registry
}
