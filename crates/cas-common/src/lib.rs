use serde::{Deserialize, Serialize};

pub mod logging;

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Source representations
// ============================================================================

/// A role held for the duration of a membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MembershipRole {
    #[serde(rename = "roleUUID", skip_serializing_if = "String::is_empty")]
    pub role_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,
}

/// The authority-scoped representation of a concept as stored in the
/// object store. Immutable once fetched; the merge only ever copies it.
///
/// Field names on the wire are camelCase with the UUID suffix kept
/// uppercase, matching the upstream store format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceRecord {
    pub uuid: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub concept_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pref_label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authority_value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strapline: Option<String>,
    #[serde(rename = "descriptionXML", skip_serializing_if = "Option::is_none")]
    pub description_xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figi_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_risk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_incorporation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_operations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lei_code: Option<String>,
    #[serde(rename = "iso31661", skip_serializing_if = "Option::is_none")]
    pub iso31661: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proper_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,
    #[serde(rename = "organisationUUID", skip_serializing_if = "Option::is_none")]
    pub organisation_uuid: Option<String>,
    #[serde(rename = "personUUID", skip_serializing_if = "Option::is_none")]
    pub person_uuid: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(rename = "parentUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub parent_uuids: Vec<String>,
    #[serde(rename = "broaderUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub broader_uuids: Vec<String>,
    #[serde(rename = "relatedUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub related_uuids: Vec<String>,
    #[serde(rename = "supersededByUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub superseded_by_uuids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub former_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trade_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub membership_roles: Vec<MembershipRole>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_founded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i64>,

    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
}

/// A single concordance row: one source uuid tied to a canonical concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConcordanceRecord {
    pub uuid: String,
    pub authority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authority_value: String,
}

// ============================================================================
// Canonical output
// ============================================================================

/// The merged canonical view of a concept. Built per notification and
/// discarded once the fan-out completes; never shared across messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalConcept {
    #[serde(rename = "prefUUID")]
    pub pref_uuid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pref_label: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub concept_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strapline: Option<String>,
    #[serde(rename = "descriptionXML", skip_serializing_if = "Option::is_none")]
    pub description_xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figi_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_risk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_incorporation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_operations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lei_code: Option<String>,
    #[serde(rename = "iso31661", skip_serializing_if = "Option::is_none")]
    pub iso31661: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proper_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,
    #[serde(rename = "organisationUUID", skip_serializing_if = "Option::is_none")]
    pub organisation_uuid: Option<String>,
    #[serde(rename = "personUUID", skip_serializing_if = "Option::is_none")]
    pub person_uuid: Option<String>,

    #[serde(rename = "parentUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub parent_uuids: Vec<String>,
    #[serde(rename = "broaderUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub broader_uuids: Vec<String>,
    #[serde(rename = "relatedUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub related_uuids: Vec<String>,
    #[serde(rename = "supersededByUUIDs", skip_serializing_if = "Vec::is_empty")]
    pub superseded_by_uuids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub former_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trade_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub membership_roles: Vec<MembershipRole>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_founded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i64>,

    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_representations: Vec<SourceRecord>,
}

// ============================================================================
// Pipeline plumbing types
// ============================================================================

/// A concept-update notification received from the queue.
///
/// `receipt_handle` is opaque and only ever handed back for the
/// acknowledgement; `bookmark` is forwarded unmodified to the
/// concordance resolver.
#[derive(Debug, Clone)]
pub struct ConceptNotification {
    pub uuid: String,
    pub bookmark: String,
    pub receipt_handle: String,
}

/// A source record together with the transaction id recorded against
/// the stored object.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub record: SourceRecord,
    pub transaction_id: String,
}

/// Body returned by the graph writer on a successful PUT. Opaque to the
/// aggregator apart from these two fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriterChange {
    pub updated_ids: Vec<String>,
    pub changed_records: Vec<serde_json::Value>,
}
