//! Markdown report rendering for completed fetches.
//!
//! A populated `error_message` takes precedence over everything else in the
//! envelope and produces the Error Report block. Otherwise each domain gets a
//! typed renderer; anything unrecognized falls through to a generic structural
//! walk of the payload. Missing fields render as "N/A", never as omissions.

use chrono::{DateTime, Utc};
use serde_json::Value;
use veridata_core::{DataType, FetchError, VerifiableDataResponse};

pub fn format_report(envelope: &VerifiableDataResponse) -> String {
    if let Some(error) = envelope.error_message.as_deref().filter(|e| !e.is_empty()) {
        return format!(
            "# Error Report\n**Message:** {error}\n\n_Please try again or rephrase your request._"
        );
    }

    let timestamp = format_timestamp(envelope.timestamp.as_deref());
    let identifier = capitalize(&envelope.request_identifier);

    let mut lines = vec!["# Verifiable Data Report".to_string(), " ".to_string()];

    let payload = envelope.data_payload.as_ref().filter(|p| p.is_object());
    match (envelope.request_data_type.parse::<DataType>().ok(), payload) {
        (Some(DataType::CryptoPrice), Some(payload)) => {
            render_crypto_price(&mut lines, envelope, payload, &identifier, &timestamp);
        }
        (Some(DataType::EducationCredential), Some(payload)) => {
            render_education(&mut lines, envelope, payload, &identifier);
        }
        (Some(DataType::SupplyChainStatus), Some(payload)) => {
            render_supply_chain(&mut lines, envelope, payload, &identifier);
        }
        (Some(DataType::CarbonFootprint), Some(payload)) => {
            render_carbon(&mut lines, envelope, payload, &identifier);
        }
        (Some(DataType::ReputationScore), Some(payload)) => {
            render_reputation(&mut lines, envelope, payload, &identifier);
        }
        (Some(data_type), None) => {
            // Known type but no object payload to pick apart; best-effort report.
            tracing::debug!(
                "{}",
                FetchError::MalformedPayload(data_type.as_str().to_string())
            );
            render_generic(&mut lines, envelope, &identifier, &timestamp);
        }
        _ => render_generic(&mut lines, envelope, &identifier, &timestamp),
    }

    lines.join("\n")
}

fn render_crypto_price(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    payload: &Value,
    identifier: &str,
    timestamp: &str,
) {
    let currency = payload
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("usd")
        .to_uppercase();
    let asset = payload
        .get("asset_id")
        .and_then(Value::as_str)
        .map(capitalize)
        .unwrap_or_else(|| identifier.to_string());
    let symbol = match currency.as_str() {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        "JPY" => "\u{a5}",
        _ => "",
    };
    let price = match payload.get("price").and_then(Value::as_f64) {
        Some(p) => format!("{symbol}{} {currency}", with_thousands(p)),
        None => "N/A".to_string(),
    };

    lines.push(format!("**Asset:** {asset}"));
    lines.push(format!("**Price:** {price}"));
    lines.push(format!("**Time:** {timestamp}"));
    lines.push(format!("**Source:** {}", opt(&envelope.source_description)));
    lines.push(format!(
        "**Verification:** {}",
        opt(&envelope.verification_summary)
    ));
}

fn render_education(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    payload: &Value,
    identifier: &str,
) {
    let profile = payload.get("profile").unwrap_or(&Value::Null);
    let name = profile
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(identifier);

    lines.push(format!("**Individual:** {name}"));
    lines.push(format!(
        "**Decentralized ID:** {}",
        na(profile.get("identifierDid"))
    ));
    lines.push(format!(
        "**Verification Method:** {}",
        opt(&envelope.verification_summary)
    ));
    lines.push(" ".to_string());

    let credentials = payload
        .get("credentials")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    if credentials.is_empty() {
        lines.push("**No credentials found for this identifier.**".to_string());
        return;
    }

    lines.push("## Verified Credentials".to_string());
    for (i, cred) in credentials.iter().enumerate() {
        let title = cred
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Credential");
        lines.push(format!("### {}. {title}", i + 1));
        lines.push(format!("**Type:** {}", na(cred.get("type"))));
        lines.push(format!("**Issuer:** {}", na(cred.get("issuer"))));
        lines.push(format!("**Issue Date:** {}", na(cred.get("issueDate"))));
        lines.push(format!(
            "**Status:** {}",
            na(cred.get("verificationStatus"))
        ));
        lines.push(format!("**Proof Method:** {}", na(cred.get("proofMethod"))));
        lines.push(" ".to_string());
    }
}

fn render_supply_chain(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    payload: &Value,
    identifier: &str,
) {
    let product = payload.get("product").unwrap_or(&Value::Null);
    let name = product
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(identifier);

    lines.push(format!("**Product:** {name}"));
    lines.push(format!(
        "**Manufacturer:** {}",
        na(product.get("manufacturer"))
    ));

    if let Some(certs) = payload.get("certifications").and_then(Value::as_array) {
        if !certs.is_empty() {
            lines.push(format!("**Certifications:** {}", join_list(certs)));
        }
    }
    if let Some(sustainability) = payload.get("sustainability") {
        lines.push(format!(
            "**Carbon Footprint:** {}",
            na(sustainability.get("carbonFootprint"))
        ));
    }
    if let Some(verification) = payload.get("verificationProof") {
        lines.push(format!(
            "**Verification Method:** {}",
            na(verification.get("method"))
        ));
        lines.push(format!(
            "**Blockchain Reference:** {}",
            na(verification.get("blockchainReference"))
        ));
    }
    lines.push(" ".to_string());

    if let Some(chain) = payload.get("supplyChain").and_then(Value::as_array) {
        if !chain.is_empty() {
            lines.push("## Supply Chain Journey".to_string());
            for stage in chain {
                let stage_name = stage
                    .get("stage")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown Stage");
                lines.push(format!("### {stage_name}"));
                lines.push(format!("**Location:** {}", na(stage.get("location"))));
                lines.push(format!("**Date:** {}", na(stage.get("timestamp"))));
                lines.push(format!(
                    "**Verification:** {} by {}",
                    na(stage.get("verificationMethod")),
                    na(stage.get("verifier"))
                ));
                lines.push(" ".to_string());
            }
        }
    }

    lines.push(format!("**Summary:** {}", opt(&envelope.verification_summary)));
}

fn render_carbon(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    payload: &Value,
    identifier: &str,
) {
    // The payload carries exactly one of productInfo / companyInfo / activityInfo.
    let (entity_type, entity_name, entity_detail) =
        if let Some(info) = payload.get("productInfo").filter(|v| v.is_object()) {
            (
                "Product",
                na_or(info.get("name"), identifier),
                format!("Manufacturer: {}", na(info.get("manufacturer"))),
            )
        } else if let Some(info) = payload.get("companyInfo").filter(|v| v.is_object()) {
            (
                "Company",
                na_or(info.get("name"), identifier),
                format!("Industry: {}", na(info.get("industry"))),
            )
        } else if let Some(info) = payload.get("activityInfo").filter(|v| v.is_object()) {
            (
                "Activity",
                na_or(info.get("type"), identifier),
                format!("Details: {}", na(info.get("details"))),
            )
        } else {
            ("Entity", identifier.to_string(), String::new())
        };

    lines.push(format!("**{entity_type}:** {entity_name}"));
    if !entity_detail.is_empty() {
        lines.push(format!("**{entity_detail}**"));
    }

    if let Some(carbon) = payload.get("carbonFootprint").filter(|v| v.is_object()) {
        let unit = carbon.get("unit").and_then(Value::as_str).unwrap_or("CO2e");
        lines.push(format!("**Carbon Footprint:** {} {unit}", na(carbon.get("total"))));
        if let Some(breakdown) = carbon.get("breakdown").and_then(Value::as_object) {
            if !breakdown.is_empty() {
                lines.push(" ".to_string());
                lines.push("### Footprint Breakdown".to_string());
                for (category, value) in breakdown {
                    lines.push(format!(
                        "**{}:** {} {unit}",
                        capitalize(category),
                        render_value(value)
                    ));
                }
            }
        }
    } else if let Some(emissions) = payload.get("emissions").filter(|v| v.is_object()) {
        let unit = emissions
            .get("unit")
            .and_then(Value::as_str)
            .unwrap_or("CO2e");
        lines.push(format!(
            "**Total Emissions:** {} {unit}",
            na(emissions.get("total"))
        ));
        if let Some(breakdown) = emissions.get("breakdown").and_then(Value::as_object) {
            if !breakdown.is_empty() {
                lines.push(" ".to_string());
                lines.push("### Emissions Breakdown".to_string());
                for (scope, value) in breakdown {
                    lines.push(format!(
                        "**{}:** {} {unit}",
                        capitalize(scope),
                        render_value(value)
                    ));
                }
            }
        }
        if payload.get("targets").is_some() {
            lines.push(format!(
                "**Reduction Targets:** {}",
                na(payload.get("targets"))
            ));
        }
    }

    lines.push(" ".to_string());
    lines.push("### Verification Details".to_string());
    if let Some(verification) = payload.get("verification").filter(|v| v.is_object()) {
        let methodology = verification
            .get("methodology")
            .or_else(|| verification.get("standard"));
        lines.push(format!("**Methodology:** {}", na(methodology)));
        lines.push(format!("**Verifier:** {}", na(verification.get("verifier"))));
        lines.push(format!("**Date:** {}", na(verification.get("date"))));
    }
    lines.push(format!("**Summary:** {}", opt(&envelope.verification_summary)));
}

fn render_reputation(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    payload: &Value,
    identifier: &str,
) {
    let entity = payload.get("entityInfo").unwrap_or(&Value::Null);
    lines.push(format!(
        "**Entity:** {}",
        na_or(entity.get("name"), identifier)
    ));
    lines.push(format!(
        "**Decentralized ID:** {}",
        na(entity.get("decentralizedId"))
    ));

    if let Some(scores) = payload.get("reputationScores").filter(|v| v.is_object()) {
        lines.push(format!("**Overall Score:** {}/100", na(scores.get("overall"))));
        if let Some(breakdown) = scores.get("breakdown").and_then(Value::as_object) {
            if !breakdown.is_empty() {
                lines.push(" ".to_string());
                lines.push("### Score Breakdown".to_string());
                for (category, score) in breakdown {
                    lines.push(format!(
                        "**{}:** {}/100",
                        display_key(category),
                        render_value(score)
                    ));
                }
            }
        }
    }

    if let Some(stats) = payload.get("statistics").and_then(Value::as_object) {
        if !stats.is_empty() {
            lines.push(" ".to_string());
            lines.push("### Key Statistics".to_string());
            for (stat, value) in stats {
                match value.as_object() {
                    Some(nested) => {
                        lines.push(format!("**{}:** ", display_key(stat)));
                        for (sub_stat, sub_value) in nested {
                            lines.push(format!(
                                "- {}: {}",
                                display_key(sub_stat),
                                render_value(sub_value)
                            ));
                        }
                    }
                    None => lines.push(format!(
                        "**{}:** {}",
                        display_key(stat),
                        render_value(value)
                    )),
                }
            }
        }
    }

    if let Some(highlights) = payload.get("highlights").and_then(Value::as_array) {
        if !highlights.is_empty() {
            lines.push(" ".to_string());
            lines.push("### Highlights".to_string());
            if highlights.iter().all(Value::is_object) {
                // Structured highlights, e.g. notable projects or contributions.
                for item in highlights {
                    if let Some(name) = item.get("name") {
                        lines.push(format!("- **{}**", render_value(name)));
                        if let Some(fields) = item.as_object() {
                            for (key, value) in fields {
                                if key != "name" {
                                    lines.push(format!(
                                        "  {}: {}",
                                        capitalize(key),
                                        render_value(value)
                                    ));
                                }
                            }
                        }
                    }
                }
            } else {
                lines.push(format!("- {}", join_list(highlights)));
            }
        }
    }

    lines.push(" ".to_string());
    lines.push("### Verification".to_string());
    let verification = payload.get("verification").unwrap_or(&Value::Null);
    lines.push(format!("**Method:** {}", na(verification.get("method"))));
    let attesters = verification
        .get("attesters")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .map(|a| join_list(a))
        .unwrap_or_else(|| "N/A".to_string());
    lines.push(format!("**Attesters:** {attesters}"));
    lines.push(format!("**Summary:** {}", opt(&envelope.verification_summary)));
}

fn render_generic(
    lines: &mut Vec<String>,
    envelope: &VerifiableDataResponse,
    identifier: &str,
    timestamp: &str,
) {
    lines.push(format!(
        "**Type:** {}",
        title_case(&envelope.request_data_type)
    ));
    lines.push(format!("**Identifier:** {identifier}"));
    lines.push(format!("**Source:** {}", opt(&envelope.source_description)));
    lines.push(format!("**Time:** {timestamp}"));
    lines.push(" ".to_string());

    match envelope.data_payload.as_ref().and_then(Value::as_object) {
        Some(payload) => {
            for (key, value) in payload {
                match value {
                    Value::Object(nested) => {
                        lines.push(format!("**{}:**", display_key(key)));
                        for (sub_key, sub_value) in nested {
                            lines.push(format!(
                                "- {}: {}",
                                display_key(sub_key),
                                render_value(sub_value)
                            ));
                        }
                    }
                    Value::Array(list) => {
                        lines.push(format!("**{}:** {}", display_key(key), join_list(list)));
                    }
                    other => {
                        lines.push(format!("**{}:** {}", display_key(key), render_value(other)));
                    }
                }
            }
        }
        None => lines.push(format!(
            "**Data:** {}",
            envelope
                .data_payload
                .as_ref()
                .map(render_value)
                .unwrap_or_else(|| "N/A".to_string())
        )),
    }

    lines.push(" ".to_string());
    lines.push(format!(
        "**Verification:** {}",
        opt(&envelope.verification_summary)
    ));
}

fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_string();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%B %d, %Y, %I:%M %p UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn opt(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("N/A")
}

/// Scalar display for a JSON value: strings unquoted, everything else compact.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn na(value: Option<&Value>) -> String {
    match value {
        Some(Value::Null) | None => "N/A".to_string(),
        Some(v) => render_value(v),
    }
}

fn na_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::Null) | None => fallback.to_string(),
        Some(v) => render_value(v),
    }
}

fn join_list(list: &[Value]) -> String {
    list.iter().map(render_value).collect::<Vec<_>>().join(", ")
}

/// First letter upper, rest lower.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Underscores to spaces, first letter of the whole key capitalized.
fn display_key(key: &str) -> String {
    capitalize(&key.replace('_', " "))
}

/// Underscores to spaces, every word capitalized.
fn title_case(s: &str) -> String {
    s.split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn with_thousands(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use veridata_core::VerifiableDataRequest;

    fn envelope(data_type: &str, payload: Value) -> VerifiableDataResponse {
        let request = VerifiableDataRequest {
            session_id: "s1".to_string(),
            data_type: data_type.to_string(),
            identifier: "bitcoin".to_string(),
            query_details: None,
        };
        VerifiableDataResponse::success(
            &request,
            data_type,
            "Test Source",
            "2024-03-05T14:30:00Z",
            payload,
            "verified by test".to_string(),
        )
    }

    #[test]
    fn error_message_takes_precedence_over_payload() {
        let mut env = envelope("crypto_price", json!({"price": 1.0}));
        env.error_message = Some("upstream exploded".to_string());
        let report = format_report(&env);
        assert!(report.starts_with("# Error Report"));
        assert!(report.contains("**Message:** upstream exploded"));
        assert!(report.contains("_Please try again or rephrase your request._"));
        assert!(!report.contains("Verifiable Data Report"));
    }

    #[test]
    fn crypto_report_formats_price_and_timestamp() {
        let env = envelope(
            "crypto_price",
            json!({"price": 65432.1, "currency": "usd", "asset_id": "bitcoin"}),
        );
        let report = format_report(&env);
        assert!(report.contains("**Asset:** Bitcoin"));
        assert!(report.contains("**Price:** $65,432.10 USD"));
        assert!(report.contains("**Time:** March 05, 2024, 02:30 PM UTC"));
    }

    #[test]
    fn missing_price_renders_not_available() {
        let env = envelope("crypto_price", json!({"currency": "eur"}));
        let report = format_report(&env);
        assert!(report.contains("**Price:** N/A"));
    }

    #[test]
    fn education_report_enumerates_credentials() {
        let env = envelope(
            "education_credential",
            json!({
                "profile": {"name": "Jane Doe", "identifierDid": "did:veri:abc"},
                "credentials": [
                    {"name": "MSc", "type": "Degree", "issuer": "MIT",
                     "issueDate": "2021-05-20", "verificationStatus": "VERIFIED",
                     "proofMethod": "ECDSA Signature"}
                ]
            }),
        );
        let report = format_report(&env);
        assert!(report.contains("**Individual:** Jane Doe"));
        assert!(report.contains("### 1. MSc"));
        assert!(report.contains("**Issuer:** MIT"));
    }

    #[test]
    fn empty_credentials_noted_explicitly() {
        let env = envelope(
            "education_credential",
            json!({"profile": {"name": "Ghost"}, "credentials": []}),
        );
        let report = format_report(&env);
        assert!(report.contains("**No credentials found for this identifier.**"));
        assert!(report.contains("**Decentralized ID:** N/A"));
    }

    #[test]
    fn carbon_company_report_uses_emissions_section() {
        let env = envelope(
            "carbon_footprint",
            json!({
                "companyInfo": {"name": "GreenCorp Technologies", "industry": "Technology"},
                "emissions": {
                    "total": 12500.0,
                    "unit": "metric tons CO2e",
                    "breakdown": {"scope1": 2000.0}
                },
                "targets": "Net Zero by 2040",
                "verification": {"standard": "GHG Protocol", "verifier": "Consortium", "date": "2023-04-20"}
            }),
        );
        let report = format_report(&env);
        assert!(report.contains("**Company:** GreenCorp Technologies"));
        assert!(report.contains("**Total Emissions:** 12500.0 metric tons CO2e"));
        assert!(report.contains("### Emissions Breakdown"));
        assert!(report.contains("**Methodology:** GHG Protocol"));
    }

    #[test]
    fn carbon_report_without_entity_info_omits_the_detail_line() {
        let env = envelope(
            "carbon_footprint",
            json!({"carbonFootprint": {"total": 1.5, "unit": "kg CO2e"}}),
        );
        let report = format_report(&env);
        assert!(report.contains("**Entity:** Bitcoin"));
        assert!(report.contains("**Carbon Footprint:** 1.5 kg CO2e"));
        assert!(!report.contains("****"));
    }

    #[test]
    fn reputation_report_lists_nested_statistics() {
        let env = envelope(
            "reputation_score",
            json!({
                "entityInfo": {"name": "Alex Rodriguez", "decentralizedId": "did:veri:dev"},
                "reputationScores": {"overall": 92, "breakdown": {"code_quality": 95}},
                "statistics": {"activity": {"commits": 1200}},
                "highlights": ["Rust", "Smart Contracts"],
                "verification": {"method": "Multi-Source Attestation", "attesters": ["GitHub", "DevDAO"]}
            }),
        );
        let report = format_report(&env);
        assert!(report.contains("**Overall Score:** 92/100"));
        assert!(report.contains("**Code quality:** 95/100"));
        assert!(report.contains("- Commits: 1200"));
        assert!(report.contains("- Rust, Smart Contracts"));
        assert!(report.contains("**Attesters:** GitHub, DevDAO"));
    }

    #[test]
    fn unknown_type_falls_back_to_structural_walk() {
        let env = envelope(
            "mystery_report",
            json!({
                "plain": "value",
                "nested": {"inner_key": 7},
                "listed": ["a", "b"]
            }),
        );
        let report = format_report(&env);
        assert!(report.contains("**Type:** Mystery Report"));
        assert!(report.contains("**Plain:** value"));
        assert!(report.contains("**Nested:**"));
        assert!(report.contains("- Inner key: 7"));
        assert!(report.contains("**Listed:** a, b"));
    }

    #[test]
    fn unparsable_timestamp_passes_through() {
        let mut env = envelope("mystery_report", json!({}));
        env.timestamp = Some("not-a-timestamp".to_string());
        let report = format_report(&env);
        assert!(report.contains("**Time:** not-a-timestamp"));
    }
}
