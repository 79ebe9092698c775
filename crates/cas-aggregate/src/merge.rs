//! Canonical merge: buckets concordance records by authority, overlays
//! secondary sources in discovery order and the primary source last, so
//! the primary's fields always win.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::concordances::ConcordanceResolver;
use crate::store::{new_transaction_id, SourceStore};
use crate::{AggregateError, Result};
use cas_common::{CanonicalConcept, ConcordanceRecord, SourceRecord};

/// Authority precedence, injected from configuration. The merge never
/// names an authority directly.
#[derive(Debug, Clone)]
pub struct AuthorityPolicy {
    /// Top-priority primary authority.
    pub primary: String,
    /// Authority that acts as primary when no top-priority source exists.
    pub secondary: String,
    /// Authority whose scope notes rank second in selection.
    pub wiki: String,
    /// Legacy tag system; contributes pref labels as scope-note
    /// candidates, used only for Location concepts.
    pub legacy_tags: String,
}

/// Resolves concordances and merges the full source set into one
/// canonical concept.
pub struct ConceptAggregator {
    resolver: Arc<dyn ConcordanceResolver>,
    store: Arc<dyn SourceStore>,
    policy: AuthorityPolicy,
}

impl ConceptAggregator {
    pub fn new(
        resolver: Arc<dyn ConcordanceResolver>,
        store: Arc<dyn SourceStore>,
        policy: AuthorityPolicy,
    ) -> Self {
        Self {
            resolver,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &AuthorityPolicy {
        &self.policy
    }

    /// Merge every source tied to `uuid` into a canonical concept.
    /// Returns the concept and the transaction id of the last
    /// successfully fetched source.
    pub async fn aggregate(
        &self,
        uuid: &str,
        bookmark: &str,
    ) -> Result<(CanonicalConcept, String)> {
        let records = self.resolver.resolve(uuid, bookmark).await?;
        if records.is_empty() {
            return Err(AggregateError::NoConcordances(uuid.to_string()));
        }

        let primary_record = self.choose_primary(uuid, &records)?;
        let primary_authority = primary_record.map(|r| r.authority.as_str());

        let mut concept = CanonicalConcept::default();
        let mut scope_notes = ScopeNoteCandidates::new(&self.policy);
        let mut transaction_id = String::new();

        for record in records
            .iter()
            .filter(|r| Some(r.authority.as_str()) != primary_authority)
        {
            let source = match self.store.get(&record.uuid).await? {
                Some(fetched) => {
                    transaction_id = fetched.transaction_id;
                    fetched.record
                }
                None => {
                    warn!(
                        uuid = %record.uuid,
                        authority = %record.authority,
                        "Source missing from store, substituting placeholder"
                    );
                    SourceRecord {
                        uuid: record.uuid.clone(),
                        authority: record.authority.clone(),
                        authority_value: record.authority_value.clone(),
                        concept_type: "Thing".to_string(),
                        ..Default::default()
                    }
                }
            };
            scope_notes.collect(&source);
            overlay(&mut concept, &source);
        }

        if let Some(record) = primary_record {
            let fetched = self
                .store
                .get(&record.uuid)
                .await?
                .ok_or_else(|| AggregateError::CanonicalMissing(record.uuid.clone()))?;
            transaction_id = fetched.transaction_id;
            scope_notes.collect(&fetched.record);
            overlay(&mut concept, &fetched.record);
        }

        concept.aliases = dedup_aliases(std::mem::take(&mut concept.aliases));
        concept.scope_note = scope_notes.select(primary_authority, &concept);

        if transaction_id.is_empty() {
            transaction_id = new_transaction_id();
        }

        debug!(
            uuid = %uuid,
            pref_uuid = %concept.pref_uuid,
            sources = concept.source_representations.len(),
            transaction_id = %transaction_id,
            "Canonical concept assembled"
        );
        Ok((concept, transaction_id))
    }

    /// Pick the concordance record whose source is overlaid last. At
    /// most one record may exist under each primary authority.
    fn choose_primary<'a>(
        &self,
        uuid: &str,
        records: &'a [ConcordanceRecord],
    ) -> Result<Option<&'a ConcordanceRecord>> {
        let primary: Vec<&ConcordanceRecord> = records
            .iter()
            .filter(|r| r.authority == self.policy.primary)
            .collect();
        if primary.len() > 1 {
            error!(
                uuid = %uuid,
                authority = %self.policy.primary,
                count = primary.len(),
                "Multiple primary-authority concordances; refusing to merge"
            );
            return Err(AggregateError::MultiplePrimaries {
                authority: self.policy.primary.clone(),
                uuid: uuid.to_string(),
            });
        }
        if let Some(record) = primary.first() {
            return Ok(Some(*record));
        }

        let secondary: Vec<&ConcordanceRecord> = records
            .iter()
            .filter(|r| r.authority == self.policy.secondary)
            .collect();
        if secondary.len() > 1 {
            error!(
                uuid = %uuid,
                authority = %self.policy.secondary,
                count = secondary.len(),
                "Multiple secondary-primary concordances; refusing to merge"
            );
            return Err(AggregateError::MultiplePrimaries {
                authority: self.policy.secondary.clone(),
                uuid: uuid.to_string(),
            });
        }
        Ok(secondary.first().copied())
    }
}

/// Overlay `s` onto the accumulator. Identity fields always take the
/// incoming value; optional fields only when non-empty; `is_deprecated`
/// always (false from a later source clears an earlier true).
fn overlay(c: &mut CanonicalConcept, s: &SourceRecord) {
    c.pref_uuid = s.uuid.clone();
    c.pref_label = s.pref_label.clone();
    c.concept_type = more_specific(&c.concept_type, &s.concept_type);

    c.aliases.extend(s.aliases.iter().cloned());
    c.aliases.push(s.pref_label.clone());

    overlay_opt(&mut c.strapline, &s.strapline);
    overlay_opt(&mut c.description_xml, &s.description_xml);
    overlay_opt(&mut c.image_url, &s.image_url);
    overlay_opt(&mut c.email_address, &s.email_address);
    overlay_opt(&mut c.facebook_page, &s.facebook_page);
    overlay_opt(&mut c.twitter_handle, &s.twitter_handle);
    overlay_opt(&mut c.short_label, &s.short_label);
    overlay_opt(&mut c.figi_code, &s.figi_code);
    overlay_opt(&mut c.issued_by, &s.issued_by);
    overlay_opt(&mut c.country_code, &s.country_code);
    overlay_opt(&mut c.country_of_risk, &s.country_of_risk);
    overlay_opt(&mut c.country_of_incorporation, &s.country_of_incorporation);
    overlay_opt(&mut c.country_of_operations, &s.country_of_operations);
    overlay_opt(&mut c.postal_code, &s.postal_code);
    overlay_opt(&mut c.lei_code, &s.lei_code);
    overlay_opt(&mut c.iso31661, &s.iso31661);
    overlay_opt(&mut c.proper_name, &s.proper_name);
    overlay_opt(&mut c.short_name, &s.short_name);
    overlay_opt(&mut c.salutation, &s.salutation);
    overlay_opt(&mut c.inception_date, &s.inception_date);
    overlay_opt(&mut c.termination_date, &s.termination_date);
    overlay_opt(&mut c.organisation_uuid, &s.organisation_uuid);
    overlay_opt(&mut c.person_uuid, &s.person_uuid);

    overlay_vec(&mut c.parent_uuids, &s.parent_uuids);
    overlay_vec(&mut c.broader_uuids, &s.broader_uuids);
    overlay_vec(&mut c.related_uuids, &s.related_uuids);
    overlay_vec(&mut c.superseded_by_uuids, &s.superseded_by_uuids);
    overlay_vec(&mut c.former_names, &s.former_names);
    overlay_vec(&mut c.trade_names, &s.trade_names);
    c.membership_roles.extend(s.membership_roles.iter().cloned());

    overlay_year(&mut c.year_founded, s.year_founded);
    overlay_year(&mut c.birth_year, s.birth_year);

    c.is_deprecated = s.is_deprecated;

    c.source_representations.push(s.clone());
}

fn overlay_opt(dst: &mut Option<String>, src: &Option<String>) {
    if let Some(v) = src {
        if !v.is_empty() {
            *dst = Some(v.clone());
        }
    }
}

fn overlay_vec<T: Clone>(dst: &mut Vec<T>, src: &[T]) {
    if !src.is_empty() {
        *dst = src.to_vec();
    }
}

fn overlay_year(dst: &mut Option<i64>, src: Option<i64>) {
    if let Some(v) = src {
        if v != 0 {
            *dst = Some(v);
        }
    }
}

/// A Thing never downgrades a known type; PublicCompany survives
/// Organisation/Company overlays.
fn more_specific(current: &str, incoming: &str) -> String {
    if incoming.is_empty() {
        return current.to_string();
    }
    if incoming == "Thing" && !current.is_empty() {
        return current.to_string();
    }
    if current == "PublicCompany" && (incoming == "Organisation" || incoming == "Company") {
        return current.to_string();
    }
    incoming.to_string()
}

fn dedup_aliases(aliases: Vec<String>) -> Vec<String> {
    aliases
        .into_iter()
        .filter(|a| !a.is_empty())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Scope-note candidates keyed by authority, gathered while merging.
struct ScopeNoteCandidates<'a> {
    policy: &'a AuthorityPolicy,
    by_authority: HashMap<String, Vec<String>>,
}

impl<'a> ScopeNoteCandidates<'a> {
    fn new(policy: &'a AuthorityPolicy) -> Self {
        Self {
            policy,
            by_authority: HashMap::new(),
        }
    }

    fn collect(&mut self, s: &SourceRecord) {
        let candidate = if s.authority == self.policy.legacy_tags {
            (!s.pref_label.is_empty()).then(|| s.pref_label.clone())
        } else {
            s.scope_note.clone().filter(|n| !n.is_empty())
        };
        if let Some(candidate) = candidate {
            self.by_authority
                .entry(s.authority.clone())
                .or_default()
                .push(candidate);
        }
    }

    /// Strict priority: chosen primary authority, then the wiki
    /// authority, then legacy tags for Locations only. Candidates equal
    /// to the canonical pref label are discarded; survivors are joined
    /// with `" | "`, and an empty string is the final fallback.
    fn select(
        &self,
        primary_authority: Option<&str>,
        concept: &CanonicalConcept,
    ) -> Option<String> {
        let mut order: Vec<&str> = Vec::with_capacity(3);
        if let Some(primary) = primary_authority {
            order.push(primary);
        }
        order.push(&self.policy.wiki);
        if concept.concept_type == "Location" {
            order.push(&self.policy.legacy_tags);
        }

        for authority in order {
            if let Some(candidates) = self.by_authority.get(authority) {
                let picked: Vec<&str> = candidates
                    .iter()
                    .map(String::as_str)
                    .filter(|c| *c != concept.pref_label)
                    .collect();
                if !picked.is_empty() {
                    return Some(picked.join(" | "));
                }
            }
        }
        Some(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thing_never_downgrades() {
        assert_eq!(more_specific("Person", "Thing"), "Person");
        assert_eq!(more_specific("", "Thing"), "Thing");
        assert_eq!(more_specific("Thing", "Person"), "Person");
    }

    #[test]
    fn public_company_survives_generic_overlays() {
        assert_eq!(more_specific("PublicCompany", "Organisation"), "PublicCompany");
        assert_eq!(more_specific("PublicCompany", "Company"), "PublicCompany");
        assert_eq!(more_specific("Organisation", "PublicCompany"), "PublicCompany");
        assert_eq!(more_specific("PublicCompany", "Person"), "Person");
    }

    #[test]
    fn empty_incoming_type_keeps_current() {
        assert_eq!(more_specific("Brand", ""), "Brand");
    }

    #[test]
    fn empty_values_do_not_clobber() {
        let mut concept = CanonicalConcept {
            facebook_page: Some("fb/root".to_string()),
            former_names: vec!["Old Name".to_string()],
            year_founded: Some(1888),
            ..Default::default()
        };
        let source = SourceRecord {
            uuid: "b".to_string(),
            facebook_page: Some(String::new()),
            year_founded: Some(0),
            ..Default::default()
        };
        overlay(&mut concept, &source);
        assert_eq!(concept.facebook_page.as_deref(), Some("fb/root"));
        assert_eq!(concept.former_names, vec!["Old Name"]);
        assert_eq!(concept.year_founded, Some(1888));
    }

    #[test]
    fn deprecation_flag_always_overlays() {
        let mut concept = CanonicalConcept {
            is_deprecated: true,
            ..Default::default()
        };
        let source = SourceRecord::default();
        overlay(&mut concept, &source);
        assert!(!concept.is_deprecated);
    }

    #[test]
    fn membership_roles_accumulate_in_discovery_order() {
        let mut concept = CanonicalConcept::default();
        let first = SourceRecord {
            membership_roles: vec![cas_common::MembershipRole {
                role_uuid: "r1".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let second = SourceRecord {
            membership_roles: vec![cas_common::MembershipRole {
                role_uuid: "r2".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        overlay(&mut concept, &first);
        overlay(&mut concept, &second);
        let roles: Vec<&str> = concept
            .membership_roles
            .iter()
            .map(|r| r.role_uuid.as_str())
            .collect();
        assert_eq!(roles, vec!["r1", "r2"]);
    }

    #[test]
    fn alias_dedup_preserves_order_and_drops_empties() {
        let aliases = vec![
            "Root".to_string(),
            String::new(),
            "Tag".to_string(),
            "Root".to_string(),
            "t1".to_string(),
        ];
        assert_eq!(dedup_aliases(aliases), vec!["Root", "Tag", "t1"]);
    }
}
