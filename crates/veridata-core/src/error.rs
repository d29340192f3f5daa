//! Failure taxonomy for the resolution core.
//!
//! Domain resolvers never surface these to the router as `Err`; every failure
//! is rendered into a populated `error_message` on an otherwise-empty envelope
//! at the resolver boundary. The enum is how failures are named consistently:
//! the router's UnsupportedType envelope message is the variant's `Display`
//! output, and resolver/gateway logs go through the other variants.

use crate::shared::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Identifier absent from the relevant domain/scope dataset.
    #[error("no record found for identifier '{identifier}' in {domain}")]
    NotFound { domain: DataType, identifier: String },

    /// `data_type` not among the five known domains. The `Display` text is the
    /// user-visible envelope message.
    #[error("Unsupported data_type: '{0}'. Supported types: {supported}.", supported = DataType::supported_list())]
    UnsupportedType(String),

    /// Live collaborator network/HTTP failure; text passes through verbatim.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A completed envelope or inbound request has no usable session binding.
    #[error("no session binding for session_id '{0}'")]
    MissingSession(String),

    /// Formatter-side: expected sub-structure absent for the claimed type.
    #[error("payload missing expected structure for '{0}'")]
    MalformedPayload(String),
}
