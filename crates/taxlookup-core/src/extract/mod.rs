//! Fault-tolerant field extraction from registry pages.
//!
//! Extraction is total: every rule resolves to [`Field::Present`] or
//! [`Field::Absent`] on its own, so a renamed or missing label on the page
//! only loses that one field. No rule's result depends on another's, which
//! means rules may be evaluated in any order.

pub mod rules;

pub use rules::{
    FieldRule, Locator, Occurrence, REGISTRY_RULES, RuleCollision, Step, check_rules,
};

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::models::company::{CompanyRecord, Field, FieldId};

/// Trait for company record extractors.
pub trait RecordExtractor {
    /// Extract a record from a parsed page.
    fn extract(&self, document: &Html) -> CompanyRecord;

    /// Parse raw HTML and extract a record from it.
    fn extract_from_html(&self, html: &str) -> CompanyRecord {
        self.extract(&Html::parse_document(html))
    }
}

/// A rule together with the labels it must not take rows from.
#[derive(Debug, Clone)]
struct PreparedRule {
    rule: FieldRule,
    claimed: Vec<&'static str>,
}

/// Table-driven extractor.
#[derive(Debug, Clone)]
pub struct RuleExtractor {
    rules: Vec<PreparedRule>,
}

impl RuleExtractor {
    /// Create an extractor over a rule table.
    ///
    /// Unresolved label collisions are logged; the table is still used.
    pub fn new(rules: &[FieldRule]) -> Self {
        for collision in check_rules(rules) {
            warn!(
                "Rule collision between {} and {}: {}",
                collision.specific, collision.generic, collision.reason
            );
        }

        let rules = rules
            .iter()
            .map(|rule| PreparedRule {
                rule: *rule,
                claimed: claimed_labels(rule, rules),
            })
            .collect();

        Self { rules }
    }

    /// Resolve a single field, or `Absent` if no rule covers it.
    pub fn resolve_field(&self, field: FieldId, document: &Html) -> Field {
        self.rules
            .iter()
            .find(|p| p.rule.field == field)
            .map(|p| resolve(&p.rule, &p.claimed, document))
            .unwrap_or_default()
    }
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self::new(REGISTRY_RULES)
    }
}

impl RecordExtractor for RuleExtractor {
    fn extract(&self, document: &Html) -> CompanyRecord {
        CompanyRecord::from_fields(self.rules.iter().map(|p| {
            let value = resolve(&p.rule, &p.claimed, document);
            debug!(
                "Field {}: {}",
                p.rule.field,
                if value.is_present() { "present" } else { "absent" }
            );
            (p.rule.field, value)
        }))
    }
}

/// Extract a record from a parsed page with the registry rule table.
pub fn extract(document: &Html) -> CompanyRecord {
    RuleExtractor::default().extract(document)
}

/// Labels of higher-priority rules that collide with `rule`.
///
/// Rows whose label cell contains one of these belong to the other rule.
/// Derived from the table alone, never from what another rule resolved to.
pub fn claimed_labels(rule: &FieldRule, rules: &[FieldRule]) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|other| other.priority > rule.priority && other.collides_with(rule))
        .filter_map(FieldRule::label_text)
        .collect()
}

/// Resolve one rule against a page.
pub fn resolve(rule: &FieldRule, claimed: &[&str], document: &Html) -> Field {
    let anchor = match rule.locator {
        Locator::ItemProp { tag, prop } => elements(document)
            .find(|el| el.value().name() == tag && el.value().attr("itemprop") == Some(prop)),
        Locator::Label { label, occurrence } => occurrence.index().and_then(|index| {
            elements(document)
                .filter(|el| el.value().name() == "tr")
                .filter(|row| {
                    label_cell_text(*row).is_some_and(|text| {
                        text.contains(label) && !claimed.iter().any(|c| text.contains(c))
                    })
                })
                .nth(index)
        }),
    };

    anchor
        .and_then(|node| walk(node, rule.path))
        .map(|node| Field::Present(node.text().collect::<String>().trim().to_string()))
        .unwrap_or(Field::Absent)
}

fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.root_element().descendants().filter_map(ElementRef::wrap)
}

fn child_elements(node: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    node.children().filter_map(ElementRef::wrap)
}

/// Own text of the row's first `td`, without nested elements.
fn label_cell_text(row: ElementRef<'_>) -> Option<String> {
    let cell = child_elements(row).find(|c| c.value().name() == "td")?;
    Some(
        cell.children()
            .filter_map(|n| n.value().as_text().map(|t| &**t))
            .collect(),
    )
}

fn walk<'a>(start: ElementRef<'a>, path: &[Step]) -> Option<ElementRef<'a>> {
    path.iter().try_fold(start, |node, step| match *step {
        Step::Child(tag) => child_elements(node).find(|c| c.value().name() == tag),
        Step::NthChild(tag, n) => child_elements(node)
            .filter(|c| c.value().name() == tag)
            .nth(n.checked_sub(1)?),
        Step::Descendant(tag) => node
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == tag),
    })
}
