//! veridata-core: resolution-and-routing core for the verifiable data agent.
//!
//! Shared envelope types, identifier normalization, the TTL cache, the session
//! correlation store, verification proofs, and the fetch router that domain
//! resolvers plug into.

mod cache;
mod config;
mod error;
mod normalize;
mod proof;
mod router;
mod session;
mod shared;

pub use cache::{ResolvedKey, TtlCache, CACHE_TTL};
pub use config::CoreConfig;
pub use error::FetchError;
pub use normalize::normalize_identifier;
pub use proof::{content_hash, prove, VerificationProof};
pub use router::{DataResolver, FetchRouter, ResolverRegistry};
pub use session::SessionStore;
pub use shared::{DataType, ErrorReply, VerifiableDataRequest, VerifiableDataResponse};
