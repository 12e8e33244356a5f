//! Company registration record extracted from a registry page.

use serde::{Deserialize, Serialize};

/// Outcome of resolving a single field.
///
/// `Absent` means no matching node was found. A node whose text trims to
/// nothing is `Present("")`, never `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Field {
    /// A node was found; holds its trimmed text.
    Present(String),
    /// No node matched.
    #[default]
    Absent,
}

impl Field {
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Borrow the value, if present.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent => None,
        }
    }

    /// Value or an empty string, for flat output formats.
    pub fn display_or_empty(&self) -> &str {
        self.as_deref().unwrap_or("")
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Absent,
        }
    }
}

impl From<Field> for Option<String> {
    fn from(field: Field) -> Self {
        match field {
            Field::Present(value) => Some(value),
            Field::Absent => None,
        }
    }
}

/// Identifies one field of a [`CompanyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Name,
    InternationalName,
    ShortName,
    TaxId,
    TaxAuthority,
    Address,
    Status,
    Representative,
    Telephone,
    FoundingDate,
    ManagingBy,
    CompanyType,
    MainIndustry,
}

impl FieldId {
    /// Every field, in record order.
    pub const ALL: [FieldId; 13] = [
        FieldId::Name,
        FieldId::InternationalName,
        FieldId::ShortName,
        FieldId::TaxId,
        FieldId::TaxAuthority,
        FieldId::Address,
        FieldId::Status,
        FieldId::Representative,
        FieldId::Telephone,
        FieldId::FoundingDate,
        FieldId::ManagingBy,
        FieldId::CompanyType,
        FieldId::MainIndustry,
    ];

    /// Stable snake_case name, used for CSV headers and config keys.
    pub fn name(self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::InternationalName => "international_name",
            FieldId::ShortName => "short_name",
            FieldId::TaxId => "tax_id",
            FieldId::TaxAuthority => "tax_authority",
            FieldId::Address => "address",
            FieldId::Status => "status",
            FieldId::Representative => "representative",
            FieldId::Telephone => "telephone",
            FieldId::FoundingDate => "founding_date",
            FieldId::ManagingBy => "managing_by",
            FieldId::CompanyType => "company_type",
            FieldId::MainIndustry => "main_industry",
        }
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A company's public registration data.
///
/// Every field is independently present or absent; a record with all fields
/// absent is still a valid result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    /// Registered company name.
    pub name: Field,

    /// Name used internationally.
    pub international_name: Field,

    /// Abbreviated name.
    pub short_name: Field,

    /// Registry tax identifier, kept opaque.
    pub tax_id: Field,

    /// Address of the managing tax office.
    pub tax_authority: Field,

    /// Registered address.
    pub address: Field,

    /// Operating status.
    pub status: Field,

    /// Legal representative.
    pub representative: Field,

    /// Contact telephone.
    pub telephone: Field,

    /// Date operations started.
    pub founding_date: Field,

    /// Managing authority.
    pub managing_by: Field,

    /// Type of enterprise.
    pub company_type: Field,

    /// Main line of business.
    pub main_industry: Field,
}

impl CompanyRecord {
    /// Build a record from resolved `(field, value)` pairs.
    ///
    /// Fields not mentioned stay absent.
    pub fn from_fields(fields: impl IntoIterator<Item = (FieldId, Field)>) -> Self {
        let mut record = Self::default();
        for (id, value) in fields {
            *record.slot_mut(id) = value;
        }
        record
    }

    /// Look up a field by id.
    pub fn get(&self, id: FieldId) -> &Field {
        match id {
            FieldId::Name => &self.name,
            FieldId::InternationalName => &self.international_name,
            FieldId::ShortName => &self.short_name,
            FieldId::TaxId => &self.tax_id,
            FieldId::TaxAuthority => &self.tax_authority,
            FieldId::Address => &self.address,
            FieldId::Status => &self.status,
            FieldId::Representative => &self.representative,
            FieldId::Telephone => &self.telephone,
            FieldId::FoundingDate => &self.founding_date,
            FieldId::ManagingBy => &self.managing_by,
            FieldId::CompanyType => &self.company_type,
            FieldId::MainIndustry => &self.main_industry,
        }
    }

    fn slot_mut(&mut self, id: FieldId) -> &mut Field {
        match id {
            FieldId::Name => &mut self.name,
            FieldId::InternationalName => &mut self.international_name,
            FieldId::ShortName => &mut self.short_name,
            FieldId::TaxId => &mut self.tax_id,
            FieldId::TaxAuthority => &mut self.tax_authority,
            FieldId::Address => &mut self.address,
            FieldId::Status => &mut self.status,
            FieldId::Representative => &mut self.representative,
            FieldId::Telephone => &mut self.telephone,
            FieldId::FoundingDate => &mut self.founding_date,
            FieldId::ManagingBy => &mut self.managing_by,
            FieldId::CompanyType => &mut self.company_type,
            FieldId::MainIndustry => &mut self.main_industry,
        }
    }

    /// Fields that resolved to a value, in record order.
    pub fn present_fields(&self) -> Vec<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|id| self.get(*id).is_present())
            .collect()
    }

    /// Check if no field was found.
    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_string_is_not_absent() {
        let field = Field::Present(String::new());
        assert!(field.is_present());
        assert_eq!(field.as_deref(), Some(""));
        assert_ne!(field, Field::Absent);
    }

    #[test]
    fn test_from_fields_leaves_rest_absent() {
        let record = CompanyRecord::from_fields([
            (FieldId::Name, Field::Present("CÔNG TY ABC".to_string())),
            (FieldId::TaxId, Field::Present("0101234567".to_string())),
        ]);

        assert_eq!(record.present_fields(), vec![FieldId::Name, FieldId::TaxId]);
        assert!(record.address.is_absent());
        assert!(!record.is_empty());
        assert!(CompanyRecord::default().is_empty());
    }

    #[test]
    fn test_serialize_absent_as_null() {
        let record = CompanyRecord::from_fields([
            (FieldId::TaxId, Field::Present("0101234567".to_string())),
            (FieldId::Telephone, Field::Present(String::new())),
        ]);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["tax_id"], "0101234567");
        assert_eq!(json["telephone"], "");
        assert!(json["name"].is_null());

        let back: CompanyRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_field_names_unique() {
        let mut names: Vec<_> = FieldId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FieldId::ALL.len());
    }
}
