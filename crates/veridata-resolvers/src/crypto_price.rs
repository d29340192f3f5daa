//! Crypto price resolver: the one live-upstream domain.
//!
//! A single attempt per request against the price API; network and HTTP
//! failures pass through into `error_message` verbatim with no retry or
//! backoff. Successful quotes are cached under (domain, currency, asset).

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use veridata_core::{
    normalize_identifier, DataResolver, DataType, FetchError, ResolvedKey, TtlCache,
    VerifiableDataRequest, VerifiableDataResponse,
};

const SOURCE: &str = "CoinGecko API (https://www.coingecko.com/en/api)";
const ERROR_SOURCE: &str = "CoinGecko API";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CURRENCY: &str = "usd";

pub struct CryptoPriceResolver {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<TtlCache>,
}

impl CryptoPriceResolver {
    pub fn new(base_url: impl Into<String>, cache: Arc<TtlCache>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
            cache,
        }
    }

    fn quote_url(&self, identifier: &str, vs_currency: &str) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url, identifier, vs_currency
        )
    }

    fn success(
        request: &VerifiableDataRequest,
        timestamp: &str,
        payload: Value,
    ) -> VerifiableDataResponse {
        VerifiableDataResponse::success(
            request,
            DataType::CryptoPrice.as_str(),
            SOURCE,
            timestamp,
            payload,
            "Data fetched live from CoinGecko API. Accuracy subject to API provider.".to_string(),
        )
    }

    fn upstream_failure(
        request: &VerifiableDataRequest,
        timestamp: &str,
        error: String,
    ) -> VerifiableDataResponse {
        VerifiableDataResponse::failure(
            request,
            DataType::CryptoPrice.as_str(),
            ERROR_SOURCE,
            timestamp,
            "Error communicating with data source.",
            error,
        )
    }
}

#[async_trait::async_trait]
impl DataResolver for CryptoPriceResolver {
    fn data_type(&self) -> DataType {
        DataType::CryptoPrice
    }

    async fn fetch(
        &self,
        request: &VerifiableDataRequest,
        timestamp: &str,
    ) -> VerifiableDataResponse {
        let identifier = normalize_identifier(&request.identifier, DataType::CryptoPrice);
        let vs_currency = request
            .query_hint("vs_currency")
            .unwrap_or(DEFAULT_CURRENCY)
            .to_lowercase();

        let key = ResolvedKey::scoped(DataType::CryptoPrice, &vs_currency, &identifier);
        if let Some(cached) = self.cache.get_fresh(&key) {
            return Self::success(request, timestamp, cached);
        }

        let url = self.quote_url(&identifier, &vs_currency);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%identifier, %vs_currency, "{}", FetchError::Upstream(err.to_string()));
                return Self::upstream_failure(
                    request,
                    timestamp,
                    format!("Request error fetching data from CoinGecko: {err}"),
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                %identifier, %vs_currency,
                "{}",
                FetchError::Upstream(format!("HTTP {status}"))
            );
            return Self::upstream_failure(
                request,
                timestamp,
                format!("HTTP error fetching data from CoinGecko: {status} - {body}"),
            );
        }

        let api_data: Value = match response.json().await {
            Ok(value) => value,
            Err(err) => {
                return Self::upstream_failure(
                    request,
                    timestamp,
                    format!("Request error fetching data from CoinGecko: {err}"),
                );
            }
        };

        // Expected shape: { identifier: { currency: price } }.
        match api_data.get(&identifier).and_then(|v| v.get(&vs_currency)) {
            Some(price) if price.is_number() => {
                let payload = json!({
                    "price": price,
                    "currency": vs_currency,
                    "asset_id": identifier,
                });
                self.cache.store(key, payload.clone());
                Self::success(request, timestamp, payload)
            }
            _ => VerifiableDataResponse::failure(
                request,
                DataType::CryptoPrice.as_str(),
                ERROR_SOURCE,
                timestamp,
                "Data source did not return expected format or identifier not found.",
                format!(
                    "Data not found for identifier '{identifier}' with currency '{vs_currency}' from CoinGecko. Response: {api_data}"
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CryptoPriceResolver {
        CryptoPriceResolver::new("https://api.coingecko.com/api/v3", Arc::new(TtlCache::new()))
    }

    #[test]
    fn quote_url_includes_identifier_and_currency() {
        let url = resolver().quote_url("bitcoin", "eur");
        assert_eq!(
            url,
            "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=eur"
        );
    }

    #[tokio::test]
    async fn cached_quote_skips_the_upstream() {
        let cache = Arc::new(TtlCache::new());
        // Unroutable base URL: any upstream attempt would fail.
        let resolver = CryptoPriceResolver::new("http://127.0.0.1:1", Arc::clone(&cache));
        cache.store(
            ResolvedKey::scoped(DataType::CryptoPrice, "usd", "bitcoin"),
            serde_json::json!({"price": 65000.0, "currency": "usd", "asset_id": "bitcoin"}),
        );
        let request = VerifiableDataRequest {
            session_id: "s1".to_string(),
            data_type: "crypto_price".to_string(),
            identifier: "Bitcoin".to_string(),
            query_details: None,
        };
        let envelope = resolver.fetch(&request, "2024-01-01T00:00:00Z").await;
        assert!(!envelope.is_error());
        let payload = envelope.data_payload.unwrap();
        assert_eq!(payload["price"], 65000.0);
    }

    #[tokio::test]
    async fn unreachable_upstream_surfaces_error_without_retry() {
        let resolver =
            CryptoPriceResolver::new("http://127.0.0.1:1", Arc::new(TtlCache::new()));
        let request = VerifiableDataRequest {
            session_id: "s1".to_string(),
            data_type: "crypto_price".to_string(),
            identifier: "bitcoin".to_string(),
            query_details: Some("vs_currency=eur".to_string()),
        };
        let envelope = resolver.fetch(&request, "2024-01-01T00:00:00Z").await;
        assert!(envelope.is_error());
        assert!(envelope
            .error_message
            .unwrap()
            .contains("Request error fetching data from CoinGecko"));
    }
}
