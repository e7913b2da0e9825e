//! Regulatory rule retrieval
//!
//! The core treats rule text as opaque: a [`RuleSource`] hands back
//! [`Citation`]s and only their reference strings reach the audit log.

use std::collections::HashMap;

use corep_schema::{CAPITAL_REQUIREMENTS, OWN_FUNDS};
use serde::{Deserialize, Serialize};

/// One retrieved regulatory reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Reference id, e.g. `CRR Article 50`
    pub reference: String,
    /// Short description of the rule
    pub summary: String,
    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Citation {
    pub fn new(reference: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            summary: summary.into(),
            keywords: Vec::new(),
        }
    }

    /// With search keywords
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive match against reference, summary and keywords
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.reference.to_lowercase().contains(&term)
            || self.summary.to_lowercase().contains(&term)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(&term))
    }
}

/// Source of regulatory citations for a template
pub trait RuleSource {
    /// Citations relevant to a template and query
    ///
    /// An empty query returns every citation known for the template.
    fn retrieve(&self, template_id: &str, query: &str) -> Vec<Citation>;
}

/// In-memory citations keyed by template id
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    citations: HashMap<String, Vec<Citation>>,
}

impl StaticRuleSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source holding the CRR references of the built-in templates
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new()
            .with_citation(
                OWN_FUNDS,
                Citation::new("CRR Article 25", "Tier 1 capital is the sum of CET1 and AT1 capital")
                    .with_keywords(["tier 1", "own funds"]),
            )
            .with_citation(
                OWN_FUNDS,
                Citation::new("CRR Article 50", "Definition of Common Equity Tier 1 capital")
                    .with_keywords(["cet1", "common equity", "tier 1", "capital"]),
            )
            .with_citation(
                OWN_FUNDS,
                Citation::new("CRR Article 51", "Definition of Additional Tier 1 capital")
                    .with_keywords(["at1", "additional tier 1", "perpetual", "capital"]),
            )
            .with_citation(
                OWN_FUNDS,
                Citation::new("CRR Article 62", "Definition of Tier 2 capital")
                    .with_keywords(["tier 2", "t2", "subordinated", "capital"]),
            )
            .with_citation(
                OWN_FUNDS,
                Citation::new("CRR Article 72", "Total own funds of an institution")
                    .with_keywords(["own funds", "total capital"]),
            )
            .with_citation(
                OWN_FUNDS,
                Citation::new("COREP ITS", "Reporting instructions for template C 01.00")
                    .with_keywords(["own funds", "reporting date"]),
            )
            .with_citation(
                CAPITAL_REQUIREMENTS,
                Citation::new(
                    "CRR Part 3",
                    "Own funds requirements for credit, market and operational risk",
                )
                .with_keywords([
                    "capital requirement",
                    "credit risk",
                    "market risk",
                    "operational risk",
                ]),
            )
            .with_citation(
                CAPITAL_REQUIREMENTS,
                Citation::new("CRR Article 92", "Own funds requirements and minimum capital ratios")
                    .with_keywords(["capital requirement", "capital ratio", "rwea"]),
            )
    }

    /// Add a citation for a template
    #[must_use]
    pub fn with_citation(mut self, template_id: impl Into<String>, citation: Citation) -> Self {
        self.add(template_id, citation);
        self
    }

    /// Add a citation for a template
    pub fn add(&mut self, template_id: impl Into<String>, citation: Citation) {
        self.citations.entry(template_id.into()).or_default().push(citation);
    }
}

impl RuleSource for StaticRuleSource {
    fn retrieve(&self, template_id: &str, query: &str) -> Vec<Citation> {
        let Some(citations) = self.citations.get(template_id) else {
            return Vec::new();
        };
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return citations.clone();
        }
        // match on the whole query first, then fall back to any single term
        let whole: Vec<Citation> = citations
            .iter()
            .filter(|c| c.matches(query.trim()))
            .cloned()
            .collect();
        if !whole.is_empty() {
            return whole;
        }
        citations
            .iter()
            .filter(|c| terms.iter().any(|t| c.matches(t)))
            .cloned()
            .collect()
    }
}
