//! Topic-specific sentence builders and the ordered table that selects them.

use clausemap_shared::text::{split_sentences, truncate_with_ellipsis};

use crate::patterns::AspectHits;

/// Minimum characters a first sentence needs to stand in as a summary.
const MIN_FALLBACK_SENTENCE_CHARS: usize = 20;

/// Maximum characters of a first-sentence fallback, ellipsis included.
pub const MAX_FALLBACK_CHARS: usize = 150;

/// Everything a builder may look at for one row.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Keyword tag as displayed in templates.
    pub tag: &'a str,
    /// Lowercased tag, used for topic and variant checks.
    pub tag_lower: &'a str,
    /// Normalized observation text.
    pub text: &'a str,
    pub hits: &'a AspectHits,
}

pub type Predicate = fn(&str) -> bool;
pub type Builder = fn(&BuildContext<'_>) -> String;

/// Topic predicates over the lowercased tag, evaluated in order; first match wins.
pub const DISPATCH: &[(&str, Predicate, Builder)] = &[
    ("data protection officer", is_dpo, build_dpo),
    ("roles", is_roles, build_roles),
    ("consent", is_consent, build_consent),
    ("security control", is_security, build_security),
    ("audit", is_audit, build_audit),
    ("individual rights", is_rights, build_rights),
    ("incident", is_incident, build_incident),
];

/// Pick the builder for a lowercased tag, falling back to [`build_generic`].
pub fn select(tag_lower: &str) -> (&'static str, Builder) {
    DISPATCH
        .iter()
        .find(|(_, matches, _)| matches(tag_lower))
        .map(|(topic, _, builder)| (*topic, *builder))
        .unwrap_or(("generic", build_generic as Builder))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn is_dpo(tag: &str) -> bool {
    contains_any(tag, &["data protection officer", "dpo"])
}

fn is_roles(tag: &str) -> bool {
    contains_any(tag, &["role", "responsibilit"])
}

fn is_consent(tag: &str) -> bool {
    tag.contains("consent")
}

fn is_security(tag: &str) -> bool {
    contains_any(
        tag,
        &[
            "access control",
            "encryption",
            "firewall",
            "antivirus",
            "mfa",
            "authentication",
        ],
    )
}

fn is_audit(tag: &str) -> bool {
    contains_any(tag, &["audit", "assessment"])
}

fn is_rights(tag: &str) -> bool {
    contains_any(tag, &["right to", "can access", "allowed to"])
}

fn is_incident(tag: &str) -> bool {
    contains_any(tag, &["breach", "incident", "response"])
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn build_dpo(ctx: &BuildContext<'_>) -> String {
    let mut duties = Vec::new();
    if ctx.hits.has("contact") {
        duties.push("serves as the designated point of contact");
    }
    if ctx.hits.has("oversight") {
        duties.push("oversees compliance monitoring");
    }
    if ctx.hits.has("rights_management") {
        duties.push("handles data subject rights requests");
    }
    if duties.is_empty() {
        return "Responsible for data protection compliance and individual rights management."
            .to_string();
    }
    sentence(&join_clauses(&duties))
}

fn build_roles(ctx: &BuildContext<'_>) -> String {
    match (ctx.hits.has("accountability"), ctx.hits.has("reporting")) {
        (true, true) => {
            "Defined responsibilities with clear accountability and reporting lines.".to_string()
        }
        (false, true) => "Defined responsibilities and escalation to management.".to_string(),
        _ => "Defined responsibilities and accountability framework.".to_string(),
    }
}

fn build_consent(ctx: &BuildContext<'_>) -> String {
    let text = ctx.text.to_lowercase();
    if ctx.hits.has("obtaining") {
        "Procedures for obtaining and recording valid user consent.".to_string()
    } else if ctx.hits.has("withdrawal") {
        "Process for allowing users to withdraw consent easily.".to_string()
    } else if text.contains("minor") || text.contains("child") {
        "Special consent requirements and verification for minors.".to_string()
    } else {
        "Consent management and tracking procedures.".to_string()
    }
}

fn build_security(ctx: &BuildContext<'_>) -> String {
    let tag = ctx.tag_lower;
    let hits = ctx.hits;
    if tag.contains("access") || hits.has("restriction") || hits.has("authorization") {
        "Controls to restrict and manage system/data access based on roles.".to_string()
    } else if tag.contains("encryption") || hits.has("protection") || hits.has("data_types") {
        "Data encryption for protection at rest and in transit.".to_string()
    } else if tag.contains("firewall") {
        "Network security controls to monitor and filter traffic.".to_string()
    } else if tag.contains("authentication") || tag.contains("mfa") || hits.has("verification")
    {
        "Multi-factor authentication for enhanced access security.".to_string()
    } else {
        format!("Security controls and measures for {}.", ctx.tag)
    }
}

fn build_audit(ctx: &BuildContext<'_>) -> String {
    if ctx.hits.has("evaluation") {
        "Regular evaluation and review of controls and compliance.".to_string()
    } else if ctx.hits.has("risk_assessment") {
        "Assessment of privacy risks and implementation of mitigation measures.".to_string()
    } else {
        "Audit procedures to verify compliance and identify improvements.".to_string()
    }
}

fn build_rights(ctx: &BuildContext<'_>) -> String {
    let tag = ctx.tag_lower;
    let hits = ctx.hits;
    if tag.contains("access") || (!tag.contains("erasure") && hits.has("access")) {
        "Procedures for handling data access requests from individuals.".to_string()
    } else if tag.contains("erasure") || tag.contains("delete") || hits.has("erasure") {
        "Process for data deletion requests and compliance verification.".to_string()
    } else if tag.contains("correct") || tag.contains("update") || hits.has("rectification") {
        "Procedures for handling data correction requests.".to_string()
    } else {
        format!("Process for handling {} requests.", ctx.tag)
    }
}

fn build_incident(ctx: &BuildContext<'_>) -> String {
    if ctx.hits.has("response") {
        "Incident response procedures and escalation protocols.".to_string()
    } else if ctx.hits.has("notification") {
        "Breach notification procedures to authorities and affected individuals.".to_string()
    } else {
        "Incident management and response framework.".to_string()
    }
}

/// Fallback for tags no topic predicate claims.
fn build_generic(ctx: &BuildContext<'_>) -> String {
    if ctx.hits.has("implementation") {
        return format!("Implementation and maintenance of {}.", ctx.tag);
    }
    if ctx.hits.has("monitoring") {
        return format!("Ongoing monitoring and oversight of {}.", ctx.tag);
    }
    match split_sentences(ctx.text).into_iter().next() {
        Some(first) if first.chars().count() > MIN_FALLBACK_SENTENCE_CHARS => {
            truncate_with_ellipsis(&first, MAX_FALLBACK_CHARS)
        }
        _ => format!("Provisions and procedures related to {}.", ctx.tag),
    }
}

/// `["a", "b", "c"]` becomes `"a, b and c"`.
fn join_clauses(clauses: &[&str]) -> String {
    match clauses {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Capitalize the first letter and terminate with a period.
fn sentence(body: &str) -> String {
    let mut chars = body.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    out.push('.');
    out
}
