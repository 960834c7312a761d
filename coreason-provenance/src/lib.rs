//! Deterministic chain-of-custody document generation over a query's results (§4.7).
//!
//! The document is a W3C PROV-O–shaped JSON-LD graph: one `prov:Activity` (the query
//! execution) and one `prov:Entity` (the aggregated response), serialized with sorted
//! object keys so the same inputs always produce byte-identical output. `serde_json`'s
//! default `Map` is backed by a `BTreeMap` (no `preserve_order` feature enabled), so plain
//! key-sorted serialization falls out of `to_string` without any extra bookkeeping.

use coreason_types::{SourceResult, SourceStatus};
use uuid::Uuid;

/// Generate the JSON-LD provenance signature for one query's aggregated results.
pub fn generate(query_id: Uuid, results: &[SourceResult]) -> String {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

    let activity_id = format!("urn:coreason:activity:{query_id}");
    let response_id = format!("urn:coreason:entity:response:{query_id}");

    let mut used_sources: Vec<&str> = results
        .iter()
        .filter(|r| r.status == SourceStatus::Success)
        .map(|r| r.source_urn.as_str())
        .collect();
    used_sources.sort_unstable();

    let mut activity = serde_json::json!({
        "@id": activity_id,
        "@type": "prov:Activity",
        "prov:endedAtTime": {
            "@value": timestamp,
            "@type": "xsd:dateTime",
        },
    });
    if !used_sources.is_empty() {
        activity["prov:used"] = serde_json::json!(used_sources);
    }

    let response_entity = serde_json::json!({
        "@id": response_id,
        "@type": "prov:Entity",
        "prov:wasGeneratedBy": activity_id,
        "coreason:queryId": query_id.to_string(),
    });

    let document = serde_json::json!({
        "@context": {
            "prov": "http://www.w3.org/ns/prov#",
            "coreason": "https://coreason.ai/provenance#",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
        },
        "@graph": [activity, response_entity],
    });

    serde_json::to_string(&document).expect("provenance document is always serializable")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(urn: &str, status: SourceStatus) -> SourceResult {
        SourceResult {
            source_urn: urn.to_string(),
            status,
            data: serde_json::json!({}),
            latency_ms: 1.0,
        }
    }

    #[test]
    fn includes_only_successful_sources_in_used() {
        let query_id = Uuid::nil();
        let results = vec![
            result("urn:a", SourceStatus::Success),
            result("urn:b", SourceStatus::Error),
        ];
        let doc = generate(query_id, &results);
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        let activity = &parsed["@graph"][0];
        assert_eq!(activity["prov:used"], serde_json::json!(["urn:a"]));
    }

    #[test]
    fn used_sources_are_sorted_by_urn() {
        let query_id = Uuid::nil();
        let results = vec![
            result("urn:zebra", SourceStatus::Success),
            result("urn:alpha", SourceStatus::Success),
        ];
        let doc = generate(query_id, &results);
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(
            parsed["@graph"][0]["prov:used"],
            serde_json::json!(["urn:alpha", "urn:zebra"])
        );
    }

    #[test]
    fn omits_used_field_when_no_source_succeeded() {
        let query_id = Uuid::nil();
        let results = vec![result("urn:a", SourceStatus::Error)];
        let doc = generate(query_id, &results);
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert!(parsed["@graph"][0].get("prov:used").is_none());
    }

    #[test]
    fn document_keys_are_sorted() {
        let doc = generate(Uuid::nil(), &[]);
        assert!(doc.starts_with("{\"@context\":"));
    }

    #[test]
    fn same_inputs_are_byte_identical_up_to_timestamp() {
        let query_id = Uuid::nil();
        let results = vec![result("urn:a", SourceStatus::Success)];
        let a = generate(query_id, &results);
        let b = generate(query_id, &results);
        // Strip the volatile timestamp value before comparing.
        let strip_ts = |s: &str| {
            let parsed: serde_json::Value = serde_json::from_str(s).unwrap();
            let mut parsed = parsed;
            parsed["@graph"][0]["prov:endedAtTime"]["@value"] = serde_json::json!("");
            parsed
        };
        assert_eq!(strip_ts(&a), strip_ts(&b));
    }

    #[test]
    fn activity_and_entity_ids_reference_the_query_id() {
        let query_id = Uuid::nil();
        let doc = generate(query_id, &[]);
        assert!(doc.contains(&format!("urn:coreason:activity:{query_id}")));
        assert!(doc.contains(&format!("urn:coreason:entity:response:{query_id}")));
    }
}
