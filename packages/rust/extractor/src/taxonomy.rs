//! Keyword taxonomy: ordered categories, their trigger phrases, and the
//! reporting domain each category rolls up to.
//!
//! Category order and keyword order are part of the contract: the extractor
//! scans categories in order and the earliest-listed keyword within a category
//! wins. TOML sources therefore use arrays of tables rather than maps.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use clausemap_shared::{ClausemapError, Result, UNKNOWN_DOMAIN};

/// One classification category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category name (e.g. `breach_notification`).
    pub name: String,
    /// Reporting domain; an empty value maps to [`UNKNOWN_DOMAIN`].
    #[serde(default)]
    pub domain: String,
    /// Trigger phrases, earliest first.
    pub keywords: Vec<String>,
}

/// Ordered, read-only keyword taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "category")]
    categories: Vec<Category>,
}

/// Built-in data-protection taxonomy: `(category, domain, keywords)`.
const BUILTIN: &[(&str, &str, &[&str])] = &[
    (
        "data_retention",
        "Information Lifecycle Management",
        &[
            "retain",
            "storage period",
            "delete after",
            "keep for",
            "dispose",
            "retention period",
        ],
    ),
    (
        "user_consent",
        "Legal and Regulatory",
        &[
            "consent",
            "opt-in",
            "opt-out",
            "unsubscribe",
            "agree",
            "permission",
            "authorization",
        ],
    ),
    (
        "breach_notification",
        "Incident and Breach Management",
        &[
            "breach",
            "security incident",
            "notify",
            "unauthorized access",
            "data loss",
            "security breach",
        ],
    ),
    (
        "user_rights",
        "Data Subject Rights",
        &[
            "right to access",
            "right to erasure",
            "right to rectification",
            "data portability",
            "access your data",
        ],
    ),
    (
        "data_collection",
        "Information Lifecycle Management",
        &[
            "collect",
            "gather",
            "obtain",
            "receive",
            "acquire",
            "personal information we collect",
        ],
    ),
    (
        "third_party_sharing",
        "Third Party Oversight",
        &[
            "share with",
            "third party",
            "service provider",
            "partner",
            "affiliate",
            "transfer to",
        ],
    ),
    (
        "data_protection_officer",
        "Governance and Operating Model",
        &["data protection officer", "dpo", "privacy officer"],
    ),
    (
        "cross_border",
        "Legal and Regulatory",
        &["cross border", "transfer outside", "international transfer"],
    ),
    (
        "data_processing_agreement",
        "Third Party Oversight",
        &["data processing agreement", "dpa", "processor"],
    ),
    (
        "privacy_notice",
        "Policies, Processes and Guidelines",
        &["privacy notice", "privacy policy"],
    ),
    (
        "data_inventory",
        "Records Management",
        &["data inventory", "record of processing"],
    ),
    (
        "purpose_limitation",
        "Information Lifecycle Management",
        &["purpose limitation", "specific purpose"],
    ),
    (
        "access_control",
        "Data Security",
        &["access control", "role-based access", "rbac"],
    ),
];

impl Taxonomy {
    /// Build a taxonomy from categories, validating names and keywords.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let taxonomy = Self { categories };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// The default data-protection taxonomy.
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(name, domain, keywords)| Category {
                name: (*name).to_string(),
                domain: (*domain).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        Self { categories }
    }

    /// Parse a taxonomy from TOML (`[[category]]` tables).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let taxonomy: Self = toml::from_str(content)
            .map_err(|e| ClausemapError::config(format!("invalid taxonomy: {e}")))?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load a taxonomy TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClausemapError::io(path, e))?;
        let taxonomy = Self::from_toml_str(&content)?;
        tracing::info!(
            ?path,
            categories = taxonomy.categories.len(),
            "loaded keyword taxonomy"
        );
        Ok(taxonomy)
    }

    /// Categories in scan order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Reporting domain for a category, or [`UNKNOWN_DOMAIN`].
    pub fn domain_for(&self, category: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.domain.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(UNKNOWN_DOMAIN)
    }

    /// Distinct domains in first-seen order.
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .map(|c| self.domain_for(&c.name))
            .filter(|d| seen.insert(*d))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(ClausemapError::validation("taxonomy has no categories"));
        }
        let mut names = HashSet::new();
        for category in &self.categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(ClausemapError::validation("taxonomy category with blank name"));
            }
            if !names.insert(name) {
                return Err(ClausemapError::validation(format!(
                    "duplicate taxonomy category '{name}'"
                )));
            }
            if category.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ClausemapError::validation(format!(
                    "taxonomy category '{name}' has no keywords"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_valid() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.categories().len(), 13);
        assert!(taxonomy.validate().is_ok());
    }

    #[test]
    fn builtin_domain_lookup() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(
            taxonomy.domain_for("breach_notification"),
            "Incident and Breach Management"
        );
        assert_eq!(taxonomy.domain_for("access_control"), "Data Security");
    }

    #[test]
    fn unmapped_category_is_unknown() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.domain_for("not_a_category"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn blank_domain_is_unknown() {
        let taxonomy = Taxonomy::new(vec![Category {
            name: "misc".into(),
            domain: "  ".into(),
            keywords: vec!["misc".into()],
        }])
        .unwrap();
        assert_eq!(taxonomy.domain_for("misc"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn domains_are_distinct_in_order() {
        let taxonomy = Taxonomy::builtin();
        let domains = taxonomy.domains();
        assert_eq!(domains[0], "Information Lifecycle Management");
        assert_eq!(domains[1], "Legal and Regulatory");
        let unique: HashSet<_> = domains.iter().collect();
        assert_eq!(unique.len(), domains.len());
    }

    #[test]
    fn toml_preserves_order() {
        let toml_str = r#"
[[category]]
name = "zeta"
domain = "Z"
keywords = ["last", "first"]

[[category]]
name = "alpha"
domain = "A"
keywords = ["alpha"]
"#;
        let taxonomy = Taxonomy::from_toml_str(toml_str).expect("parse");
        let names: Vec<_> = taxonomy.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(taxonomy.categories()[0].keywords, vec!["last", "first"]);
    }

    #[test]
    fn duplicate_category_rejected() {
        let toml_str = r#"
[[category]]
name = "dup"
keywords = ["a"]

[[category]]
name = "dup"
keywords = ["b"]
"#;
        let err = Taxonomy::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_taxonomy_rejected() {
        assert!(Taxonomy::new(vec![]).is_err());
    }

    #[test]
    fn category_without_keywords_rejected() {
        let result = Taxonomy::new(vec![Category {
            name: "empty".into(),
            domain: "X".into(),
            keywords: vec!["  ".into()],
        }]);
        assert!(result.unwrap_err().to_string().contains("no keywords"));
    }

    #[test]
    fn builtin_toml_roundtrip() {
        let taxonomy = Taxonomy::builtin();
        let toml_str = toml::to_string(&taxonomy).expect("serialize");
        let parsed = Taxonomy::from_toml_str(&toml_str).expect("parse");
        assert_eq!(parsed, taxonomy);
    }
}
