//! Pattern library: keyword families, their aspects, and trigger phrases.
//!
//! A family groups the aspects that can be detected in observations about one
//! topic (for example `contact` and `oversight` for a data protection officer).
//! Row keyword tags are resolved to a family with graceful degradation, ending
//! at the mandatory `default` family.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use clausemap_shared::{ClausemapError, Result};

/// Name of the family every unresolved tag falls back to.
pub const DEFAULT_FAMILY: &str = "default";

/// One detectable aspect within a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    pub name: String,
    pub triggers: Vec<String>,
}

/// A named group of aspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFamily {
    pub name: String,
    #[serde(rename = "aspect", default)]
    pub aspects: Vec<Aspect>,
}

impl PatternFamily {
    /// Record which aspects have at least one trigger in `text`.
    ///
    /// Matching is case-insensitive substring containment.
    pub fn score(&self, text: &str) -> AspectHits {
        let lowered = text.to_lowercase();
        let mut hits = AspectHits::default();
        for aspect in &self.aspects {
            for trigger in &aspect.triggers {
                let needle = trigger.trim().to_lowercase();
                if !needle.is_empty() && lowered.contains(&needle) {
                    hits.record(&aspect.name, trigger);
                }
            }
        }
        hits
    }
}

/// Sparse record of detected aspects and the triggers that fired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspectHits(BTreeMap<String, Vec<String>>);

impl AspectHits {
    fn record(&mut self, aspect: &str, trigger: &str) {
        self.0
            .entry(aspect.to_string())
            .or_default()
            .push(trigger.to_string());
    }

    /// Whether any trigger of `aspect` was found.
    pub fn has(&self, aspect: &str) -> bool {
        self.0.contains_key(aspect)
    }

    /// Triggers that fired for `aspect`, in family order.
    pub fn matches(&self, aspect: &str) -> &[String] {
        self.0.get(aspect).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Detected aspect names, sorted.
    pub fn aspects(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Read-only set of pattern families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLibrary {
    #[serde(rename = "family")]
    families: Vec<PatternFamily>,
}

/// Built-in library: `(family, [(aspect, triggers)])`.
type BuiltinFamily = (&'static str, &'static [(&'static str, &'static [&'static str])]);

const BUILTIN: &[BuiltinFamily] = &[
    (
        "data protection officer",
        &[
            (
                "contact",
                &["contact", "address", "reach out", "write to", "responsible for"],
            ),
            (
                "oversight",
                &["oversight", "monitor", "ensure compliance", "advise on"],
            ),
            (
                "rights_management",
                &["access", "rectify", "withdraw", "limit", "consent", "erasure"],
            ),
        ],
    ),
    (
        "roles and responsibilities",
        &[
            (
                "accountability",
                &["responsible for", "accountable for", "duties include", "role involves"],
            ),
            ("tasks", &["perform", "conduct", "implement", "manage", "maintain"]),
            ("reporting", &["report to", "escalate to", "inform management"]),
        ],
    ),
    (
        "lawful bases",
        &[
            (
                "legal_grounds",
                &[
                    "lawful basis",
                    "legal ground",
                    "legitimate interest",
                    "consent",
                    "contract",
                    "legal obligation",
                ],
            ),
            ("documentation", &["document", "record", "maintain records"]),
            ("compliance", &["comply with", "in accordance with", "based on"]),
        ],
    ),
    (
        "consent",
        &[
            (
                "obtaining",
                &["obtain consent", "get consent", "request consent", "seek approval"],
            ),
            (
                "management",
                &["manage consent", "track consent", "record consent", "consent log"],
            ),
            (
                "withdrawal",
                &["withdraw consent", "revoke consent", "opt-out", "remove consent"],
            ),
        ],
    ),
    (
        "minors",
        &[
            (
                "age_verification",
                &["verify age", "age check", "parental consent", "guardian approval"],
            ),
            (
                "protection",
                &["special protection", "additional safeguards", "child privacy"],
            ),
            (
                "consent_rules",
                &["parental consent", "guardian approval", "age-based rules"],
            ),
        ],
    ),
    (
        "privacy policy",
        &[
            ("content", &["describe", "explain", "outline", "detail"]),
            ("rights", &["rights of", "entitled to", "can access"]),
            ("procedures", &["procedure for", "process for", "steps to"]),
        ],
    ),
    (
        "privacy notice",
        &[
            ("communication", &["inform", "notify", "disclose to", "tell users"]),
            ("transparency", &["clear", "transparent", "easily accessible"]),
            ("timing", &["at collection", "before processing", "upon request"]),
        ],
    ),
    (
        "data classification",
        &[
            ("categorization", &["classify", "categorize", "label", "tag"]),
            ("levels", &["confidential", "restricted", "public", "internal"]),
            (
                "handling",
                &["handle according to", "based on classification", "appropriate safeguards"],
            ),
        ],
    ),
    (
        "data management lifecycle",
        &[
            (
                "stages",
                &["collection", "storage", "processing", "retention", "disposal"],
            ),
            (
                "controls",
                &["control at each stage", "throughout lifecycle", "end-to-end"],
            ),
            ("policies", &["policies for each stage", "lifecycle management"]),
        ],
    ),
    (
        "access control",
        &[
            (
                "authentication",
                &["authenticate", "verify identity", "login credentials"],
            ),
            (
                "authorization",
                &["authorize", "permissions", "role-based", "privileges"],
            ),
            (
                "restriction",
                &["restrict access", "limit access", "prevent unauthorized"],
            ),
        ],
    ),
    (
        "encryption",
        &[
            ("protection", &["encrypt", "cipher", "encode", "cryptographic"]),
            (
                "data_types",
                &["data at rest", "data in transit", "storage encryption"],
            ),
            ("standards", &["encryption standard", "algorithm", "key management"]),
        ],
    ),
    (
        "multi-factor authentication",
        &[
            (
                "verification",
                &["multiple factors", "two-factor", "biometric", "token"],
            ),
            (
                "security",
                &["enhance security", "additional layer", "strong authentication"],
            ),
        ],
    ),
    (
        "audit and assessment",
        &[
            (
                "evaluation",
                &["evaluate", "review", "assess effectiveness", "periodic"],
            ),
            (
                "risk_assessment",
                &["risk assessment", "impact assessment", "dpia", "mitigat"],
            ),
        ],
    ),
    (
        "breach and incident",
        &[
            ("response", &["respond", "response", "contain", "escalat"]),
            (
                "notification",
                &["notify", "notification", "inform the authorit", "report to"],
            ),
        ],
    ),
    (
        "data subject rights",
        &[
            ("access", &["right of access", "access request", "copy of"]),
            ("erasure", &["erase", "erasure", "delete", "deletion"]),
            ("rectification", &["rectify", "rectification", "correct"]),
        ],
    ),
    (
        DEFAULT_FAMILY,
        &[
            ("implementation", &["implement", "deploy", "set up", "establish"]),
            ("maintenance", &["maintain", "update", "review regularly"]),
            ("monitoring", &["monitor", "track", "oversee", "supervise"]),
        ],
    ),
];

impl PatternLibrary {
    /// Build a validated library.
    pub fn new(families: Vec<PatternFamily>) -> Result<Self> {
        let library = Self { families };
        library.validate()?;
        Ok(library)
    }

    /// The built-in data-protection library.
    pub fn builtin() -> Self {
        let families = BUILTIN
            .iter()
            .map(|(name, aspects)| PatternFamily {
                name: (*name).to_string(),
                aspects: aspects
                    .iter()
                    .map(|(aspect, triggers)| Aspect {
                        name: (*aspect).to_string(),
                        triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { families }
    }

    /// Parse and validate a TOML library (`[[family]]` / `[[family.aspect]]`).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let library: Self = toml::from_str(content)
            .map_err(|e| ClausemapError::parse(format!("invalid pattern library: {e}")))?;
        library.validate()?;
        Ok(library)
    }

    /// Load a library from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClausemapError::io(path, e))?;
        let library = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            families = library.families.len(),
            "loaded pattern library"
        );
        Ok(library)
    }

    pub fn families(&self) -> &[PatternFamily] {
        &self.families
    }

    /// The mandatory fallback family.
    pub fn default_family(&self) -> &PatternFamily {
        self.families
            .iter()
            .find(|f| f.name.trim().eq_ignore_ascii_case(DEFAULT_FAMILY))
            .unwrap_or(&FALLBACK)
    }

    /// Resolve a keyword tag to the best family. Never fails.
    ///
    /// Containment of the lowered tag in a family name (or the reverse) wins
    /// first, then any whitespace token of one found inside the other, then
    /// the `default` family.
    pub fn resolve_family(&self, tag: &str) -> &PatternFamily {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return self.default_family();
        }

        let names: Vec<String> = self
            .families
            .iter()
            .map(|f| f.name.trim().to_lowercase())
            .collect();

        let contained = names
            .iter()
            .position(|name| name.contains(tag.as_str()) || tag.contains(name.as_str()));
        if let Some(index) = contained {
            return &self.families[index];
        }

        let overlapping = names.iter().position(|name| {
            name.split_whitespace().any(|t| tag.contains(t))
                || tag.split_whitespace().any(|t| name.contains(t))
        });
        match overlapping {
            Some(index) => &self.families[index],
            None => self.default_family(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self
            .families
            .iter()
            .any(|f| f.name.trim().eq_ignore_ascii_case(DEFAULT_FAMILY))
        {
            return Err(ClausemapError::validation(format!(
                "pattern library must define a `{DEFAULT_FAMILY}` family"
            )));
        }
        let mut seen = HashSet::new();
        for family in &self.families {
            let name = family.name.trim();
            if name.is_empty() {
                return Err(ClausemapError::validation("pattern family with blank name"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ClausemapError::validation(format!(
                    "duplicate pattern family `{name}`"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Used only if a library was built without validation and lacks `default`.
static FALLBACK: PatternFamily = PatternFamily {
    name: String::new(),
    aspects: Vec::new(),
};
