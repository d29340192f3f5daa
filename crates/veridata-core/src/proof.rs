//! Verification proofs: reproducible content hashes over resolved records.
//!
//! The hash is SHA-256 over a canonical serialization (object keys sorted
//! recursively), so identical record content yields an identical hash on any
//! call path. This is a reproducibility guarantee, not a third-party-checkable
//! signature.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationProof {
    pub method: String,
    pub hash: String,
    pub timestamp: String,
}

/// Derives a proof for a resolved record with the given method label.
pub fn prove(record: &Value, method: &str, timestamp: &str) -> VerificationProof {
    VerificationProof {
        method: method.to_string(),
        hash: content_hash(record),
        timestamp: timestamp.to_string(),
    }
}

/// Hex-encoded SHA-256 digest of the record's canonical form.
pub fn content_hash(record: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(record, &mut canonical);
    let digest = Sha256::digest(canonical.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Serializes with object keys in sorted order at every depth, so the digest
/// never depends on serde_json's map iteration order (which changes under the
/// `preserve_order` feature).
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_content_hashes_identically() {
        let a = json!({"name": "EcoBook", "total": 185.3, "breakdown": {"manufacturing": 142.8}});
        let b = json!({"breakdown": {"manufacturing": 142.8}, "total": 185.3, "name": "EcoBook"});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = json!({"total": 185.3});
        let b = json!({"total": 185.4});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_is_hex_sha256() {
        let h = content_hash(&json!({"k": "v"}));
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn proof_carries_method_and_timestamp() {
        let record = json!({"score": 92});
        let proof = prove(&record, "Multi-Attestation Protocol", "2024-01-01T00:00:00Z");
        assert_eq!(proof.method, "Multi-Attestation Protocol");
        assert_eq!(proof.timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(proof.hash, content_hash(&record));
    }
}
