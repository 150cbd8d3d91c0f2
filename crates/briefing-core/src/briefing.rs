//! Typed view of the canonical briefing payload.
//!
//! The upstream agent's schema is advisory: every field is optional and any
//! section may arrive malformed. [`BriefingPayload::from_object`] therefore
//! decodes each top-level section independently, so one bad section drops
//! only itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::AgentBriefing;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingProfilePosition {
    pub role: Option<String>,
    pub org: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingProfileMetadata {
    pub subject: Option<String>,
    pub data_source: Option<String>,
    pub political_party: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingNewsEntry {
    pub date: Option<String>,
    pub headline: Option<String>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub sentiment: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingControversy {
    pub topic: Option<String>,
    pub context: Option<String>,
    pub source_url: Option<String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingProfileSummary {
    pub biography: Option<String>,
    pub current_position: Option<BriefingProfilePosition>,
    pub previous_positions: Option<Vec<BriefingProfilePosition>>,
    pub political_party: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingPositions {
    pub current: Option<BriefingProfilePosition>,
    pub previous: Option<Vec<BriefingProfilePosition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingProfile {
    pub metadata: Option<BriefingProfileMetadata>,
    pub summary: Option<BriefingProfileSummary>,
    pub positions: Option<BriefingPositions>,
    /// Older agent revisions put the biography at the profile's top level.
    pub biography: Option<String>,
    pub relevant_news: Option<Vec<BriefingNewsEntry>>,
    pub controversies: Option<Vec<BriefingControversy>>,
}

// ---------------------------------------------------------------------------
// Media influence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingRecurringTopic {
    pub topic: Option<String>,
    pub evidence: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingReputationalRisk {
    pub risk: Option<String>,
    pub rationale: Option<String>,
    pub evidence: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingMediaEvent {
    pub date: Option<String>,
    pub title: Option<String>,
    pub impact: Option<String>,
    pub outlet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingMediaInfluence {
    pub media_positioning: Option<String>,
    pub recurring_topics: Option<Vec<BriefingRecurringTopic>>,
    pub reputational_risks_media: Option<Vec<BriefingReputationalRisk>>,
    pub key_media_events: Option<Vec<BriefingMediaEvent>>,
    pub sectors_with_presence: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Social opinion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingThemeEvidence {
    pub quote_or_paraphrase: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingKeyTheme {
    pub theme: Option<String>,
    pub subthemes: Option<Vec<String>>,
    pub why_it_matters: Option<String>,
    pub evidence: Option<Vec<BriefingThemeEvidence>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingTypicalExpression {
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingAudienceArchetype {
    pub label: Option<String>,
    pub motivation: Option<String>,
    pub typical_expression: Option<BriefingTypicalExpression>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingSocialControversy {
    pub topic: Option<String>,
    pub evidence: Option<Vec<BriefingThemeEvidence>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingSocialMetadata {
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingSocialOpinion {
    pub metadata: Option<BriefingSocialMetadata>,
    pub general_narrative: Option<String>,
    pub key_themes: Option<Vec<BriefingKeyTheme>>,
    pub predominant_emotions: Option<Vec<String>>,
    pub audience_archetypes: Option<Vec<BriefingAudienceArchetype>>,
    pub social_controversies: Option<Vec<BriefingSocialControversy>>,
}

// ---------------------------------------------------------------------------
// Risks & opportunities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingRiskOpportunity {
    pub title: Option<String>,
    pub rationale: Option<String>,
    pub evidence_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingRisksOpportunities {
    pub media_risks: Option<Vec<BriefingRiskOpportunity>>,
    pub social_risks: Option<Vec<BriefingRiskOpportunity>>,
    pub press_opportunities: Option<Vec<BriefingRiskOpportunity>>,
    pub audience_opportunities: Option<Vec<BriefingRiskOpportunity>>,
}

// ---------------------------------------------------------------------------
// BriefingMeta / BriefingPayload
// ---------------------------------------------------------------------------

/// Envelope metadata attached by the dispatch proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingMeta {
    pub requested_at: Option<String>,
    pub ui: Option<String>,
    pub source_webhook_url: Option<String>,
}

/// The substantive investigation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingPayload {
    pub profile: Option<BriefingProfile>,
    pub media_influence: Option<BriefingMediaInfluence>,
    pub social_opinion: Option<BriefingSocialOpinion>,
    pub risks_opportunities: Option<BriefingRisksOpportunities>,
    pub narrative_summary: Option<String>,
    pub recommended_strategy: Option<String>,
    pub missing_data: Option<Vec<String>>,
}

fn section<T: serde::de::DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    serde_json::from_value(object.get(key)?.clone()).ok()
}

impl BriefingPayload {
    /// Project a raw payload object into the typed model, section by
    /// section. A section that fails to decode is dropped; the rest stand.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            profile: section(object, "profile"),
            media_influence: section(object, "media_influence"),
            social_opinion: section(object, "social_opinion"),
            risks_opportunities: section(object, "risks_opportunities"),
            narrative_summary: section(object, "narrative_summary"),
            recommended_strategy: section(object, "recommended_strategy"),
            missing_data: section(object, "missing_data"),
        }
    }
}

impl AgentBriefing {
    /// Typed view of this briefing's payload.
    pub fn report(&self) -> BriefingPayload {
        BriefingPayload::from_object(&self.payload)
    }
}

// ---------------------------------------------------------------------------
// Subject / biography extraction
// ---------------------------------------------------------------------------

/// Placeholder the upstream agent emits when it could not identify anyone.
const SUBJECT_PLACEHOLDER: &str = "no detectado";

fn sanitize_subject(subject: Option<&str>) -> Option<String> {
    let trimmed = subject?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(SUBJECT_PLACEHOLDER) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Best-available subject name: profile metadata first, then the social
/// opinion section's own metadata.
pub fn extract_primary_subject(payload: &BriefingPayload) -> Option<String> {
    let profile_subject = payload
        .profile
        .as_ref()
        .and_then(|p| p.metadata.as_ref())
        .and_then(|m| sanitize_subject(m.subject.as_deref()));
    if profile_subject.is_some() {
        return profile_subject;
    }
    payload
        .social_opinion
        .as_ref()
        .and_then(|s| s.metadata.as_ref())
        .and_then(|m| sanitize_subject(m.subject.as_deref()))
}

/// Biography from the profile summary, falling back to the older top-level
/// profile field.
pub fn extract_primary_biography(payload: &BriefingPayload) -> Option<String> {
    payload
        .profile
        .as_ref()
        .and_then(|p| {
            p.summary
                .as_ref()
                .and_then(|s| s.biography.clone())
                .or_else(|| p.biography.clone())
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn from_object_decodes_known_sections() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "metadata": { "subject": "Juan Ríos" } },
            "narrative_summary": "steady coverage",
            "missing_data": ["financial records"]
        })));
        assert_eq!(
            payload.profile.unwrap().metadata.unwrap().subject.as_deref(),
            Some("Juan Ríos")
        );
        assert_eq!(payload.narrative_summary.as_deref(), Some("steady coverage"));
        assert_eq!(payload.missing_data.unwrap(), vec!["financial records"]);
    }

    #[test]
    fn malformed_section_drops_only_itself() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": "this should have been an object",
            "recommended_strategy": "engage local press"
        })));
        assert!(payload.profile.is_none());
        assert_eq!(
            payload.recommended_strategy.as_deref(),
            Some("engage local press")
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "metadata": { "subject": "Ana", "future_field": 1 } }
        })));
        assert_eq!(
            payload.profile.unwrap().metadata.unwrap().subject.as_deref(),
            Some("Ana")
        );
    }

    #[test]
    fn subject_prefers_profile_metadata() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "metadata": { "subject": "  Ana Pérez  " } },
            "social_opinion": { "metadata": { "subject": "Other Name" } }
        })));
        assert_eq!(extract_primary_subject(&payload).as_deref(), Some("Ana Pérez"));
    }

    #[test]
    fn subject_falls_back_to_social_opinion() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "metadata": { "subject": "No Detectado" } },
            "social_opinion": { "metadata": { "subject": "Juan Ríos" } }
        })));
        assert_eq!(extract_primary_subject(&payload).as_deref(), Some("Juan Ríos"));
    }

    #[test]
    fn placeholder_and_blank_subjects_yield_none() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "metadata": { "subject": "   " } },
            "social_opinion": { "metadata": { "subject": "no detectado" } }
        })));
        assert_eq!(extract_primary_subject(&payload), None);
    }

    #[test]
    fn biography_prefers_summary_over_top_level() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": {
                "summary": { "biography": "from summary" },
                "biography": "from top level"
            }
        })));
        assert_eq!(
            extract_primary_biography(&payload).as_deref(),
            Some("from summary")
        );
    }

    #[test]
    fn biography_falls_back_to_top_level_field() {
        let payload = BriefingPayload::from_object(&object(json!({
            "profile": { "biography": "from top level" }
        })));
        assert_eq!(
            extract_primary_biography(&payload).as_deref(),
            Some("from top level")
        );
    }

    #[test]
    fn report_projects_normalized_briefing() {
        let briefing = normalize(&json!({
            "payload": {
                "profile": { "metadata": { "subject": "Juan Ríos" } },
                "risks_opportunities": {
                    "media_risks": [
                        { "title": "coverage gap", "evidence_ids": ["n1"] }
                    ]
                }
            }
        }))
        .unwrap();
        let report = briefing.report();
        assert_eq!(extract_primary_subject(&report).as_deref(), Some("Juan Ríos"));
        let risks = report.risks_opportunities.unwrap().media_risks.unwrap();
        assert_eq!(risks[0].title.as_deref(), Some("coverage gap"));
    }

    #[test]
    fn meta_round_trips_camel_case() {
        let meta: BriefingMeta = serde_json::from_value(json!({
            "requestedAt": "2025-11-02T10:00:00Z",
            "ui": "Briefing Investigator",
            "sourceWebhookUrl": "https://hooks.example.com/entry"
        }))
        .unwrap();
        assert_eq!(meta.ui.as_deref(), Some("Briefing Investigator"));
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("sourceWebhookUrl").is_some());
    }
}
