#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Anonymization of analysis summaries before they leave the process.
//!
//! Real sensor names and the target plate are replaced with opaque codes
//! (the area ids themselves, plus a vehicle code) before the summary text
//! is sent to the narrative-generation service; the reversal map restores
//! them in the returned narrative. Substitution always runs longest key
//! first so a short code never corrupts a longer one it is a prefix of.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque code substituted for the target vehicle's plate.
pub const VEHICLE_CODE: &str = "Vehicle-A";

/// What an opaque code stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalEntry {
    /// The real name the code replaces.
    pub name: String,
    /// Importance label attached during anonymization, when any
    /// (e.g. "key location 2" for a ranked stay area).
    pub label: Option<String>,
}

/// Code -> real-value map produced by [`anonymize_summary`], consumed by
/// [`deanonymize_report`]. Codes are stable within one run.
pub type ReversalMap = BTreeMap<String, ReversalEntry>;

/// Replaces real names in a formatted summary with opaque codes.
///
/// * `area_names`: every clustered area id and its representative
///   sensor name.
/// * `ranked_areas`: area ids in stay-importance order; these receive
///   numbered "key location" labels in the reversal map.
/// * `vehicle_id`: the target plate, replaced by [`VEHICLE_CODE`].
///
/// Longer sensor names are substituted before shorter ones, so a name
/// that is a substring of another can never corrupt it.
#[must_use]
pub fn anonymize_summary(
    summary_text: &str,
    area_names: &BTreeMap<String, String>,
    ranked_areas: &[String],
    vehicle_id: &str,
) -> (String, ReversalMap) {
    let mut reversal: ReversalMap = area_names
        .iter()
        .map(|(area_id, name)| {
            (
                area_id.clone(),
                ReversalEntry {
                    name: name.clone(),
                    label: None,
                },
            )
        })
        .collect();

    for (rank, area_id) in ranked_areas.iter().enumerate() {
        if let Some(entry) = reversal.get_mut(area_id) {
            entry.label = Some(format!("key location {}", rank + 1));
        }
    }

    reversal.insert(
        VEHICLE_CODE.to_string(),
        ReversalEntry {
            name: vehicle_id.to_string(),
            label: Some("target vehicle".to_string()),
        },
    );

    let mut names: Vec<&String> = area_names.values().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut text = summary_text.to_string();
    for name in names {
        let Some(area_id) = area_names
            .iter()
            .find_map(|(id, n)| (n == name).then_some(id))
        else {
            continue;
        };
        text = text.replace(name.as_str(), area_id);
    }
    text = text.replace(vehicle_id, VEHICLE_CODE);

    log::debug!(
        "Anonymized summary: {} codes in reversal map",
        reversal.len()
    );

    (text, reversal)
}

/// Restores real names in a generated narrative.
///
/// Codes are substituted longest first: "Area-1" can never clobber the
/// "Area-1" prefix of "Area-10".
#[must_use]
pub fn deanonymize_report(report_text: &str, reversal: &ReversalMap) -> String {
    let mut codes: Vec<&String> = reversal.keys().collect();
    codes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut text = report_text.to_string();
    for code in codes {
        text = text.replace(code.as_str(), &reversal[code].name);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_names() -> BTreeMap<String, String> {
        [
            ("Area-000", "Riverside Plaza North Gate"),
            ("Area-001", "Riverside Plaza"),
            ("Area-002", "Dock Rd"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn longer_names_are_replaced_first() {
        let summary = "Stays at Riverside Plaza North Gate, then Riverside Plaza.";
        let (text, _) = anonymize_summary(
            summary,
            &area_names(),
            &["Area-001".to_string()],
            "ABC-1234",
        );
        assert_eq!(text, "Stays at Area-000, then Area-001.");
    }

    #[test]
    fn plate_is_replaced_with_vehicle_code() {
        let summary = "Vehicle ABC-1234 stayed at Dock Rd.";
        let (text, reversal) = anonymize_summary(summary, &area_names(), &[], "ABC-1234");
        assert_eq!(text, "Vehicle Vehicle-A stayed at Area-002.");
        assert_eq!(reversal[VEHICLE_CODE].name, "ABC-1234");
    }

    #[test]
    fn ranked_areas_get_numbered_labels() {
        let (_, reversal) = anonymize_summary(
            "",
            &area_names(),
            &["Area-002".to_string(), "Area-000".to_string()],
            "ABC-1234",
        );
        assert_eq!(
            reversal["Area-002"].label.as_deref(),
            Some("key location 1")
        );
        assert_eq!(
            reversal["Area-000"].label.as_deref(),
            Some("key location 2")
        );
        assert_eq!(reversal["Area-001"].label, None);
    }

    #[test]
    fn deanonymize_restores_longest_codes_first() {
        let mut reversal = ReversalMap::new();
        reversal.insert(
            "Area-1".to_string(),
            ReversalEntry {
                name: "Old Mill".to_string(),
                label: None,
            },
        );
        reversal.insert(
            "Area-10".to_string(),
            ReversalEntry {
                name: "Harbor Front".to_string(),
                label: None,
            },
        );

        let text = deanonymize_report("Seen at Area-10 and again at Area-1.", &reversal);
        assert_eq!(text, "Seen at Harbor Front and again at Old Mill.");
    }

    #[test]
    fn anonymize_then_deanonymize_round_trips() {
        let summary = "ABC-1234 commutes between Dock Rd and Riverside Plaza.";
        let (anonymized, reversal) = anonymize_summary(summary, &area_names(), &[], "ABC-1234");
        assert!(!anonymized.contains("ABC-1234"));
        assert!(!anonymized.contains("Dock Rd"));

        let restored = deanonymize_report(&anonymized, &reversal);
        assert_eq!(restored, summary);
    }
}
