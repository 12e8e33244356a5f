//! Field location rules for registry pages.
//!
//! Each [`FieldRule`] says where one field lives in the page: which node to
//! match, which occurrence to take, and how to walk from the match to the
//! node carrying the text. Label rows are matched by substring, so labels
//! that contain one another (`Địa chỉ` ⊂ `Địa chỉ Thuế`) are disambiguated by
//! an explicit `priority`: a row claimed by a colliding rule of higher
//! priority is never a candidate for the lower one.

use crate::models::company::FieldId;

/// How to find the anchor node for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Element with the given tag carrying `itemprop="<prop>"`.
    ItemProp {
        tag: &'static str,
        prop: &'static str,
    },
    /// Table row whose label cell (first `td`) contains `label`.
    Label {
        label: &'static str,
        occurrence: Occurrence,
    },
}

/// Which of several matching nodes to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    First,
    /// 1-indexed, in document order.
    Nth(usize),
}

impl Occurrence {
    /// Zero-based index into the candidate list.
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Occurrence::First => Some(0),
            Occurrence::Nth(n) => n.checked_sub(1),
        }
    }
}

/// One step from the anchor node towards the text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// First direct child element with this tag.
    Child(&'static str),
    /// N-th (1-indexed) direct child element with this tag.
    NthChild(&'static str, usize),
    /// First descendant element with this tag, at any depth.
    Descendant(&'static str),
}

/// Value cell of a label row.
const VALUE_CELL: Step = Step::NthChild("td", 2);

/// A single extraction directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: FieldId,
    pub locator: Locator,
    pub path: &'static [Step],
    /// Higher wins when two label rules contain one another.
    pub priority: u8,
}

impl FieldRule {
    /// Rule anchored on an `itemprop` attribute.
    pub const fn item_prop(
        field: FieldId,
        tag: &'static str,
        prop: &'static str,
        path: &'static [Step],
    ) -> Self {
        Self {
            field,
            locator: Locator::ItemProp { tag, prop },
            path,
            priority: 0,
        }
    }

    /// Rule anchored on the first row whose label contains `label`.
    pub const fn label(field: FieldId, label: &'static str, path: &'static [Step]) -> Self {
        Self {
            field,
            locator: Locator::Label {
                label,
                occurrence: Occurrence::First,
            },
            path,
            priority: 0,
        }
    }

    /// Take the N-th matching row instead of the first.
    pub const fn nth(mut self, n: usize) -> Self {
        if let Locator::Label { label, .. } = self.locator {
            self.locator = Locator::Label {
                label,
                occurrence: Occurrence::Nth(n),
            };
        }
        self
    }

    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Row label, for label rules.
    pub fn label_text(&self) -> Option<&'static str> {
        match self.locator {
            Locator::Label { label, .. } => Some(label),
            Locator::ItemProp { .. } => None,
        }
    }

    /// Check if two label rules can match the same row.
    ///
    /// Identical labels are not a collision; they are told apart by
    /// occurrence instead.
    pub fn collides_with(&self, other: &FieldRule) -> bool {
        match (self.label_text(), other.label_text()) {
            (Some(a), Some(b)) => a != b && (a.contains(b) || b.contains(a)),
            _ => false,
        }
    }
}

/// Rule table for masothue.com company pages.
pub const REGISTRY_RULES: &[FieldRule] = &[
    FieldRule::item_prop(FieldId::Name, "th", "name", &[Step::Child("span")]),
    FieldRule::label(
        FieldId::InternationalName,
        "Tên quốc tế",
        &[VALUE_CELL, Step::Child("span")],
    ),
    FieldRule::label(
        FieldId::ShortName,
        "Tên viết tắt",
        &[VALUE_CELL, Step::Child("span")],
    ),
    FieldRule::item_prop(FieldId::TaxId, "td", "taxID", &[Step::Child("span")]),
    FieldRule::label(
        FieldId::TaxAuthority,
        "Địa chỉ Thuế",
        &[VALUE_CELL, Step::Child("span")],
    )
    .with_priority(1),
    FieldRule::label(FieldId::Address, "Địa chỉ", &[VALUE_CELL, Step::Child("span")]),
    FieldRule::label(FieldId::Status, "Tình trạng", &[VALUE_CELL]),
    FieldRule::label(
        FieldId::Representative,
        "Người đại diện",
        &[VALUE_CELL, Step::Descendant("a")],
    ),
    FieldRule::label(FieldId::Telephone, "Điện thoại", &[VALUE_CELL]),
    FieldRule::label(
        FieldId::FoundingDate,
        "Ngày hoạt động",
        &[VALUE_CELL, Step::Child("span")],
    ),
    FieldRule::label(
        FieldId::ManagingBy,
        "Quản lý bởi",
        &[VALUE_CELL, Step::Child("span")],
    ),
    FieldRule::label(FieldId::CompanyType, "Loại hình DN", &[VALUE_CELL]),
    FieldRule::label(
        FieldId::MainIndustry,
        "Ngành nghề chính",
        &[VALUE_CELL, Step::Child("a")],
    ),
];

/// A pair of rules whose priorities do not settle a label collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCollision {
    /// The rule with the longer, more specific label.
    pub specific: FieldId,
    /// The rule whose label is a substring of the other.
    pub generic: FieldId,
    pub reason: String,
}

/// Report label collisions not resolved by priority.
///
/// The rule with the longer label must carry the strictly higher priority.
/// Two rules with the same label and the same occurrence are also reported.
pub fn check_rules(rules: &[FieldRule]) -> Vec<RuleCollision> {
    let mut collisions = Vec::new();

    for (i, a) in rules.iter().enumerate() {
        for b in &rules[i + 1..] {
            let (Some(label_a), Some(label_b)) = (a.label_text(), b.label_text()) else {
                continue;
            };

            if label_a == label_b {
                if a.locator == b.locator {
                    collisions.push(RuleCollision {
                        specific: a.field,
                        generic: b.field,
                        reason: format!("both rules take the same `{label_a}` row"),
                    });
                }
                continue;
            }

            if !a.collides_with(b) {
                continue;
            }

            let (specific, generic) = if label_a.contains(label_b) { (a, b) } else { (b, a) };
            if specific.priority <= generic.priority {
                collisions.push(RuleCollision {
                    specific: specific.field,
                    generic: generic.field,
                    reason: format!(
                        "`{}` contains `{}` but priority {} is not above {}",
                        specific.label_text().unwrap_or_default(),
                        generic.label_text().unwrap_or_default(),
                        specific.priority,
                        generic.priority
                    ),
                });
            }
        }
    }

    collisions
}
