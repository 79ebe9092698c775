//! Type-driven behaviour tables: URL slugs, search-indexing rules and
//! cache side-purges. Everything keyed on the concept type string so
//! the pipeline stays free of per-type branches.

use std::collections::{HashMap, HashSet};

use cas_common::CanonicalConcept;

/// Which related-concept field a side-purge reads.
#[derive(Debug, Clone, Copy)]
enum RelatedField {
    IssuedBy,
    PersonUuid,
}

#[derive(Debug, Clone, Copy)]
struct SidePurge {
    field: RelatedField,
    slug: &'static str,
}

pub struct TypeRegistry {
    slug_overrides: HashMap<&'static str, &'static str>,
    search_excluded: HashSet<&'static str>,
    /// Types indexed for search only when a source carries a curated
    /// authority.
    curated_gated: HashSet<&'static str>,
    side_purges: HashMap<&'static str, SidePurge>,
    curated_authorities: HashSet<String>,
    public_types: HashSet<String>,
}

impl TypeRegistry {
    pub fn new(curated_authorities: Vec<String>, public_types: Vec<String>) -> Self {
        let slug_overrides = HashMap::from([
            ("Person", "people"),
            ("PublicCompany", "organisations"),
            ("MembershipRole", "membership-roles"),
            ("AlphavilleSeries", "alphaville-series"),
            ("Dummy", "dummies"),
        ]);

        let search_excluded =
            HashSet::from(["FinancialInstrument", "MembershipRole", "BoardRole"]);

        let curated_gated = HashSet::from(["Membership"]);

        let side_purges = HashMap::from([
            (
                "Membership",
                SidePurge {
                    field: RelatedField::PersonUuid,
                    slug: "people",
                },
            ),
            (
                "FinancialInstrument",
                SidePurge {
                    field: RelatedField::IssuedBy,
                    slug: "organisations",
                },
            ),
        ]);

        Self {
            slug_overrides,
            search_excluded,
            curated_gated,
            side_purges,
            curated_authorities: curated_authorities.into_iter().collect(),
            public_types: public_types.into_iter().collect(),
        }
    }

    /// URL path fragment the sink writers use for this type.
    pub fn slug(&self, concept_type: &str) -> String {
        match self.slug_overrides.get(concept_type) {
            Some(slug) => (*slug).to_string(),
            None => derive_slug(concept_type),
        }
    }

    /// Whether this type has a public read endpoint of its own.
    pub fn is_public(&self, concept_type: &str) -> bool {
        self.public_types.contains(concept_type)
    }

    /// Whether the concept belongs in the search index.
    pub fn allowed_in_search(&self, concept: &CanonicalConcept) -> bool {
        let concept_type = concept.concept_type.as_str();
        if self.search_excluded.contains(concept_type) {
            return false;
        }
        if self.curated_gated.contains(concept_type) {
            return concept
                .source_representations
                .iter()
                .any(|s| self.curated_authorities.contains(&s.authority));
        }
        true
    }

    /// A related concept whose cache entries must also be invalidated,
    /// with the slug of its public endpoint.
    pub fn side_purge(&self, concept: &CanonicalConcept) -> Option<(String, String)> {
        self.side_purges
            .get(concept.concept_type.as_str())
            .and_then(|sp| {
                let related = match sp.field {
                    RelatedField::IssuedBy => concept.issued_by.as_ref(),
                    RelatedField::PersonUuid => concept.person_uuid.as_ref(),
                };
                related
                    .filter(|uuid| !uuid.is_empty())
                    .map(|uuid| (uuid.clone(), sp.slug.to_string()))
            })
    }
}

/// Derive a slug from a camel-cased type name: a `-` goes in at each
/// lower-to-upper and acronym-to-word boundary, then lowercase and a
/// plural `s`.
fn derive_slug(concept_type: &str) -> String {
    let chars: Vec<char> = concept_type.chars().collect();
    let mut slug = String::with_capacity(concept_type.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                slug.push('-');
            }
        }
        slug.extend(c.to_lowercase());
    }

    slug.push('s');
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_common::SourceRecord;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(
            vec!["Editorial".to_string()],
            vec!["Person".to_string(), "Brand".to_string()],
        )
    }

    #[test]
    fn irregular_slugs_come_from_the_override_table() {
        let registry = registry();
        assert_eq!(registry.slug("Person"), "people");
        assert_eq!(registry.slug("PublicCompany"), "organisations");
        assert_eq!(registry.slug("MembershipRole"), "membership-roles");
        assert_eq!(registry.slug("AlphavilleSeries"), "alphaville-series");
        assert_eq!(registry.slug("Dummy"), "dummies");
    }

    #[test]
    fn regular_slugs_are_derived() {
        let registry = registry();
        assert_eq!(registry.slug("Brand"), "brands");
        assert_eq!(registry.slug("Organisation"), "organisations");
        assert_eq!(registry.slug("FinancialInstrument"), "financial-instruments");
        assert_eq!(registry.slug("SpecialReport"), "special-reports");
        assert_eq!(
            registry.slug("NAICSIndustryClassification"),
            "naics-industry-classifications"
        );
    }

    #[test]
    fn excluded_types_never_reach_search() {
        let registry = registry();
        for concept_type in ["FinancialInstrument", "MembershipRole", "BoardRole"] {
            let concept = CanonicalConcept {
                concept_type: concept_type.to_string(),
                ..Default::default()
            };
            assert!(!registry.allowed_in_search(&concept), "{concept_type}");
        }
    }

    #[test]
    fn membership_needs_a_curated_source() {
        let registry = registry();
        let mut concept = CanonicalConcept {
            concept_type: "Membership".to_string(),
            source_representations: vec![SourceRecord {
                authority: "Registry".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(!registry.allowed_in_search(&concept));

        concept.source_representations.push(SourceRecord {
            authority: "Editorial".to_string(),
            ..Default::default()
        });
        assert!(registry.allowed_in_search(&concept));
    }

    #[test]
    fn side_purge_reads_the_related_field() {
        let registry = registry();
        let membership = CanonicalConcept {
            concept_type: "Membership".to_string(),
            person_uuid: Some("person-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            registry.side_purge(&membership),
            Some(("person-1".to_string(), "people".to_string()))
        );

        let instrument = CanonicalConcept {
            concept_type: "FinancialInstrument".to_string(),
            issued_by: Some("org-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            registry.side_purge(&instrument),
            Some(("org-1".to_string(), "organisations".to_string()))
        );

        let person = CanonicalConcept {
            concept_type: "Person".to_string(),
            ..Default::default()
        };
        assert_eq!(registry.side_purge(&person), None);
    }
}
