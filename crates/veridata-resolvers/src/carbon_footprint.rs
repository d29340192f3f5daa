//! Carbon footprint resolver: product, company, and activity scopes.
//!
//! The one multi-scope domain on the static side. Scope resolution priority:
//! an explicitly requested scope wins only when the identifier exists there,
//! otherwise the first scope (product, company, activity) containing the
//! identifier, otherwise `product` as the backstop.

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use veridata_core::{
    normalize_identifier, prove, DataResolver, DataType, FetchError, ResolvedKey, TtlCache,
    VerifiableDataRequest, VerifiableDataResponse,
};

const SOURCE: &str = "Verified Carbon Accounting Network";
const NOT_FOUND_SOURCE: &str = "Carbon Footprint Verification Network";
const PROOF_METHOD: &str = "Multi-Attestation Protocol";

/// Record views for the carbon footprint domain, in auto-detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarbonScope {
    Product,
    Company,
    Activity,
}

impl CarbonScope {
    pub const ALL: [CarbonScope; 3] = [
        CarbonScope::Product,
        CarbonScope::Company,
        CarbonScope::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarbonScope::Product => "product",
            CarbonScope::Company => "company",
            CarbonScope::Activity => "activity",
        }
    }
}

impl FromStr for CarbonScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" => Ok(CarbonScope::Product),
            "company" => Ok(CarbonScope::Company),
            "activity" => Ok(CarbonScope::Activity),
            _ => Err(()),
        }
    }
}

/// Static reference data standing in for verified environmental impact sources
/// and carbon accounting systems.
static CARBON_RECORDS: Lazy<Value> = Lazy::new(|| {
    json!({
        "product": {
            "macbook_pro": {
                "name": "EcoBook Pro 2023",
                "manufacturer": "GreenTech Inc.",
                "totalFootprint": 185.3,
                "footprintBreakdown": {
                    "manufacturing": 142.8,
                    "transportation": 12.5,
                    "usage": 30.0,
                    "endOfLife": 0.0
                },
                "certifications": ["Carbon Trust", "Energy Star", "EPEAT Gold"],
                "methodology": "ISO 14067 / GHG Protocol",
                "verificationBody": "ClimateVerify Alliance",
                "verificationDate": "2023-07-15"
            },
            "sustainable_blend": {
                "name": "Sustainable Blend Coffee",
                "manufacturer": "EcoBeans Co.",
                "totalFootprint": 0.15,
                "footprintBreakdown": {
                    "farming": 0.05,
                    "processing": 0.03,
                    "packaging": 0.02,
                    "transportation": 0.04,
                    "preparation": 0.01
                },
                "offsetting": "100% offset through verified reforestation projects",
                "certifications": ["Rainforest Alliance", "Carbon Neutral Product"],
                "methodology": "PAS 2050",
                "verificationBody": "GreenCertify DAO",
                "verificationDate": "2023-08-10"
            }
        },
        "company": {
            "greencorp": {
                "name": "GreenCorp Technologies",
                "industry": "Technology",
                "totalEmissions": 12500.0,
                "emissionsBreakdown": {
                    "scope1": 2000.0,
                    "scope2": 8000.0,
                    "scope3": 2500.0
                },
                "reductionTarget": "50% by 2030, Net Zero by 2040",
                "verificationStandard": "GHG Protocol Corporate Standard",
                "verifier": "ClimateAccounting Consortium",
                "verificationDate": "2023-04-20"
            },
            "fashion_forward": {
                "name": "FashionX Sustainable Apparel",
                "industry": "Fashion",
                "totalEmissions": 18700.0,
                "emissionsBreakdown": {
                    "scope1": 1200.0,
                    "scope2": 4500.0,
                    "scope3": 13000.0
                },
                "reductionActions": [
                    "100% renewable energy in owned facilities",
                    "Sustainable materials sourcing",
                    "Supply chain optimization"
                ],
                "reductionTarget": "Net Zero by 2035",
                "verificationStandard": "Science Based Targets initiative (SBTi)",
                "verifier": "SustainableVerify Network",
                "verificationDate": "2023-03-15"
            }
        },
        "activity": {
            "london_nyc_flight": {
                "type": "Flight",
                "route": "London to New York (economy)",
                "distance": 5585,
                "footprint": 986.0,
                "calculationMethod": "DEFRA 2023 emission factors",
                "verifier": "TravelImpact Verifiers",
                "offsetOptions": [
                    {"project": "Wind Energy India", "cost": "€12.50"},
                    {"project": "Reforestation Brazil", "cost": "€15.75"}
                ]
            },
            "california_electricity": {
                "type": "Electricity Consumption",
                "location": "California, USA",
                "amount": 1000,
                "footprint": 210.0,
                "gridMix": {
                    "renewable": 33.0,
                    "natural_gas": 40.0,
                    "nuclear": 15.0,
                    "coal": 10.0,
                    "other": 2.0
                },
                "calculationMethod": "eGRID 2022 (location-based)",
                "verifier": "GridImpact Alliance",
                "verificationDate": "2023-02-10"
            }
        }
    })
});

fn record(scope: CarbonScope, identifier: &str) -> Option<&'static Value> {
    CARBON_RECORDS.get(scope.as_str())?.get(identifier)
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

pub struct CarbonFootprintResolver {
    cache: Arc<TtlCache>,
}

impl CarbonFootprintResolver {
    pub fn new(cache: Arc<TtlCache>) -> Self {
        Self { cache }
    }

    fn resolve_scope(requested: Option<CarbonScope>, identifier: &str) -> CarbonScope {
        Self::resolve_scope_in(requested, |scope| record(scope, identifier).is_some())
    }

    /// `present` reports whether the identifier exists in a scope's dataset.
    fn resolve_scope_in(
        requested: Option<CarbonScope>,
        present: impl Fn(CarbonScope) -> bool,
    ) -> CarbonScope {
        if let Some(scope) = requested {
            if present(scope) {
                return scope;
            }
        }
        CarbonScope::ALL
            .into_iter()
            .find(|scope| present(*scope))
            .unwrap_or(CarbonScope::Product)
    }

    fn shape_payload(scope: CarbonScope, data: &Value, proof: Value) -> Value {
        match scope {
            CarbonScope::Product => json!({
                "productInfo": {
                    "name": str_field(data, "name"),
                    "manufacturer": str_field(data, "manufacturer"),
                },
                "carbonFootprint": {
                    "total": data.get("totalFootprint").cloned().unwrap_or(Value::Null),
                    "unit": "kg CO2e",
                    "breakdown": data.get("footprintBreakdown").cloned().unwrap_or(Value::Null),
                },
                "certifications": data.get("certifications").cloned().unwrap_or_else(|| json!([])),
                "verification": {
                    "methodology": str_field(data, "methodology"),
                    "verifier": str_field(data, "verificationBody"),
                    "date": str_field(data, "verificationDate"),
                    "proof": proof,
                }
            }),
            CarbonScope::Company => json!({
                "companyInfo": {
                    "name": str_field(data, "name"),
                    "industry": str_field(data, "industry"),
                },
                "emissions": {
                    "total": data.get("totalEmissions").cloned().unwrap_or(Value::Null),
                    "unit": "metric tons CO2e",
                    "breakdown": data.get("emissionsBreakdown").cloned().unwrap_or(Value::Null),
                },
                "targets": str_field(data, "reductionTarget"),
                "verification": {
                    "standard": str_field(data, "verificationStandard"),
                    "verifier": str_field(data, "verifier"),
                    "date": str_field(data, "verificationDate"),
                    "proof": proof,
                }
            }),
            CarbonScope::Activity => {
                let details = if !str_field(data, "route").is_empty() {
                    str_field(data, "route")
                } else {
                    str_field(data, "location")
                };
                json!({
                    "activityInfo": {
                        "type": str_field(data, "type"),
                        "details": details,
                    },
                    "carbonFootprint": {
                        "total": data.get("footprint").cloned().unwrap_or(Value::Null),
                        "unit": "kg CO2e",
                        "distance": data.get("distance").cloned().unwrap_or(Value::Null),
                        "amount": data.get("amount").cloned().unwrap_or(Value::Null),
                    },
                    "methodology": str_field(data, "calculationMethod"),
                    "verification": {
                        "verifier": str_field(data, "verifier"),
                        "date": str_field(data, "verificationDate"),
                        "proof": proof,
                    }
                })
            }
        }
    }

    fn summary(data: &Value) -> String {
        let methodology = [str_field(data, "methodology"), str_field(data, "verificationStandard")]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("international standards");
        let verifier = [str_field(data, "verificationBody"), str_field(data, "verifier")]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("accredited verifier");
        format!("Carbon footprint data verified following {methodology} by {verifier}.")
    }
}

#[async_trait::async_trait]
impl DataResolver for CarbonFootprintResolver {
    fn data_type(&self) -> DataType {
        DataType::CarbonFootprint
    }

    async fn fetch(
        &self,
        request: &VerifiableDataRequest,
        timestamp: &str,
    ) -> VerifiableDataResponse {
        let normalized = normalize_identifier(&request.identifier, DataType::CarbonFootprint);
        let requested = request
            .query_hint("scope")
            .and_then(|s| s.parse::<CarbonScope>().ok());
        let scope = Self::resolve_scope(requested, &normalized);

        let key = ResolvedKey::scoped(DataType::CarbonFootprint, scope.as_str(), &normalized);
        let snapshot = self
            .cache
            .get_or_compute(&key, || record(scope, &normalized).cloned());

        match snapshot {
            Some(data) => {
                let proof = prove(&data, PROOF_METHOD, timestamp);
                let proof_value = serde_json::to_value(&proof).unwrap_or(Value::Null);
                let summary = Self::summary(&data);
                let payload = Self::shape_payload(scope, &data, proof_value);
                VerifiableDataResponse::success(
                    request,
                    self.data_type().as_str(),
                    SOURCE,
                    timestamp,
                    payload,
                    summary,
                )
            }
            None => {
                warn!(
                    "{}",
                    FetchError::NotFound {
                        domain: self.data_type(),
                        identifier: normalized.clone(),
                    }
                );
                let error = match requested {
                    Some(scope) => format!(
                        "No carbon footprint information found for {} identifier '{}'.",
                        scope.as_str(),
                        request.identifier
                    ),
                    None => format!(
                        "No carbon footprint information found for identifier '{}' in any scope (product, company, activity).",
                        request.identifier
                    ),
                };
                VerifiableDataResponse::failure(
                    request,
                    self.data_type().as_str(),
                    NOT_FOUND_SOURCE,
                    timestamp,
                    "No carbon footprint data found.",
                    error,
                )
            }
        }
    }
}
