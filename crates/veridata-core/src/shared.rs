//! Shared wire types for the verifiable data agent.
//!
//! `VerifiableDataRequest` is the structured request produced by the external
//! language-understanding collaborator; `VerifiableDataResponse` is the common
//! envelope every domain resolver returns. The envelope schema does not force
//! payload and error to be mutually exclusive; a non-empty `error_message` is
//! authoritative for consumers (see the gateway formatter).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The five supported data domains. Dispatch is closed over this enum so an
/// unhandled domain is a compile error, not a silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    CryptoPrice,
    EducationCredential,
    SupplyChainStatus,
    CarbonFootprint,
    ReputationScore,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::CryptoPrice,
        DataType::EducationCredential,
        DataType::SupplyChainStatus,
        DataType::CarbonFootprint,
        DataType::ReputationScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::CryptoPrice => "crypto_price",
            DataType::EducationCredential => "education_credential",
            DataType::SupplyChainStatus => "supply_chain_status",
            DataType::CarbonFootprint => "carbon_footprint",
            DataType::ReputationScore => "reputation_score",
        }
    }

    /// Quoted, comma-separated list of supported type names for error text.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|t| format!("'{}'", t.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ();

    /// Case-insensitive: the router dispatches on `data_type` regardless of casing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crypto_price" => Ok(DataType::CryptoPrice),
            "education_credential" => Ok(DataType::EducationCredential),
            "supply_chain_status" => Ok(DataType::SupplyChainStatus),
            "carbon_footprint" => Ok(DataType::CarbonFootprint),
            "reputation_score" => Ok(DataType::ReputationScore),
            _ => Err(()),
        }
    }
}

/// Structured request for verifiable data.
///
/// `data_type` stays a string on the wire (unknown types must yield an
/// UnsupportedType envelope, not a deserialization failure); the router parses
/// it into [`DataType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiableDataRequest {
    pub session_id: String,
    pub data_type: String,
    pub identifier: String,
    /// Optional `key=value` hints, e.g. `vs_currency=eur`, `scope=company`, `aspect=developer`.
    #[serde(default)]
    pub query_details: Option<String>,
}

impl VerifiableDataRequest {
    /// Extracts a `key=value` hint from `query_details`. Values end at the next
    /// `&`, `,`, `;`, or whitespace.
    pub fn query_hint(&self, key: &str) -> Option<&str> {
        let details = self.query_details.as_deref()?;
        let needle = format!("{}=", key);
        let start = details.find(&needle)? + needle.len();
        let rest = &details[start..];
        let end = rest
            .find(|c: char| c == '&' || c == ',' || c == ';' || c.is_whitespace())
            .unwrap_or(rest.len());
        let value = &rest[..end];
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Common response envelope shared by all domain resolvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiableDataResponse {
    pub session_id: String,
    pub request_data_type: String,
    pub request_identifier: String,
    #[serde(default)]
    pub source_description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data_payload: Option<Value>,
    #[serde(default)]
    pub verification_summary: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl VerifiableDataResponse {
    /// Envelope for a successful resolution.
    pub fn success(
        request: &VerifiableDataRequest,
        data_type: &str,
        source: &str,
        timestamp: &str,
        payload: Value,
        summary: String,
    ) -> Self {
        Self {
            session_id: request.session_id.clone(),
            request_data_type: data_type.to_string(),
            request_identifier: request.identifier.clone(),
            source_description: Some(source.to_string()),
            timestamp: Some(timestamp.to_string()),
            data_payload: Some(payload),
            verification_summary: Some(summary),
            error_message: None,
        }
    }

    /// Envelope for a failed resolution: empty payload, populated `error_message`.
    pub fn failure(
        request: &VerifiableDataRequest,
        data_type: &str,
        source: &str,
        timestamp: &str,
        summary: &str,
        error: String,
    ) -> Self {
        Self {
            session_id: request.session_id.clone(),
            request_data_type: data_type.to_string(),
            request_identifier: request.identifier.clone(),
            source_description: Some(source.to_string()),
            timestamp: Some(timestamp.to_string()),
            data_payload: Some(Value::Object(serde_json::Map::new())),
            verification_summary: Some(summary.to_string()),
            error_message: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message
            .as_deref()
            .map(|e| !e.is_empty())
            .unwrap_or(false)
    }
}

/// Slim internal variant for failed fetches routed back to the session owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub session_id: String,
    pub error: String,
}
