// Asset record and document schemas shared by every pipeline stage

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::ExtractError;

/// Marker inserted between pages of the plain-text rendering of a document.
pub const PAGE_SEPARATOR: &str =
    "\n================================================================================\n";

/// Field values the model uses to say "not found".
const UNSPECIFIED_SENTINELS: [&str; 4] = ["unspecified", "null", "none", "n/a"];

/// The fixed set of columns an asset record can carry.
///
/// Declaration order is the spreadsheet column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetField {
    AssetName,
    Filename,
    DeliveryDate,
    City,
    Country,
    StartOfLease,
    LeaseDurationYears,
    Seller,
    Tenant,
    Gla,
    IpRent,
    StartOfContract,
}

impl AssetField {
    pub const ALL: [AssetField; 12] = [
        AssetField::AssetName,
        AssetField::Filename,
        AssetField::DeliveryDate,
        AssetField::City,
        AssetField::Country,
        AssetField::StartOfLease,
        AssetField::LeaseDurationYears,
        AssetField::Seller,
        AssetField::Tenant,
        AssetField::Gla,
        AssetField::IpRent,
        AssetField::StartOfContract,
    ];

    /// Canonical column name, bit-exact with existing workbooks.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetField::AssetName => "Asset Name",
            AssetField::Filename => "Filename",
            AssetField::DeliveryDate => "Delivery Date",
            AssetField::City => "City",
            AssetField::Country => "Country",
            AssetField::StartOfLease => "Start of Lease",
            AssetField::LeaseDurationYears => "Lease Duration in Years",
            AssetField::Seller => "Seller",
            AssetField::Tenant => "Tenant",
            AssetField::Gla => "GLA (Gross Leasable Area)",
            AssetField::IpRent => "IP-Rent",
            AssetField::StartOfContract => "Start of Contract",
        }
    }

    /// One-line semantics used in the extraction prompt.
    pub fn description(&self) -> &'static str {
        match self {
            AssetField::AssetName => "This is the primary key, a pdf file can have many assets in it",
            AssetField::Filename => "this is the filename of the pdf file from where the asset is extracted",
            AssetField::DeliveryDate => "delivery date of the asset",
            AssetField::City => "city of the asset",
            AssetField::Country => "country of the asset",
            AssetField::StartOfLease => "asset's start of lease",
            AssetField::LeaseDurationYears => "asset's lease duration in years",
            AssetField::Seller => "asset's seller",
            AssetField::Tenant => "asset's tenant",
            AssetField::Gla => "asset's GLA",
            AssetField::IpRent => "asset's IP-Rent",
            AssetField::StartOfContract => "asset's start of contract",
        }
    }

    /// Comma-separated list of every canonical field name.
    pub fn field_list() -> String {
        Self::ALL
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Match a key emitted by the model to a field.
    ///
    /// Matching is case-insensitive and accepts the short spellings that some
    /// prompt variants produce ("GLA", "IP Rent", ...).
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_lowercase();

        if let Some(field) = Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().to_lowercase() == normalized)
        {
            return Some(field);
        }

        match normalized.as_str() {
            "asset" | "asset_name" | "assetname" | "name" => Some(AssetField::AssetName),
            "file name" | "file" | "source" => Some(AssetField::Filename),
            "delivery" | "delivery_date" => Some(AssetField::DeliveryDate),
            "lease start" | "start_of_lease" => Some(AssetField::StartOfLease),
            "lease duration" | "lease duration (years)" | "lease_duration_in_years" => {
                Some(AssetField::LeaseDurationYears)
            }
            "gla" | "gross leasable area" | "gla (gross leasable area, string, optional)" => {
                Some(AssetField::Gla)
            }
            "ip rent" | "ip_rent" | "iprent" | "in-place rent" => Some(AssetField::IpRent),
            "contract start" | "start_of_contract" => Some(AssetField::StartOfContract),
            _ => None,
        }
    }
}

impl fmt::Display for AssetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A populated field value. Absent fields are simply not stored.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Number),
}

impl FieldValue {
    /// Normalise a decoded JSON value.
    ///
    /// Returns `Ok(None)` for null, empty strings and the "unspecified"
    /// sentinels, and an error for nested objects.
    pub fn from_json(value: &Value) -> Result<Option<Self>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Self::from_text(text)),
            Value::Number(number) => Ok(Some(FieldValue::Number(number.clone()))),
            Value::Bool(flag) => Ok(Some(FieldValue::Text(flag.to_string()))),
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match Self::from_json(item)? {
                        Some(part) => parts.push(part.to_string()),
                        None => continue,
                    }
                }
                if parts.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(FieldValue::Text(parts.join(", "))))
                }
            }
            Value::Object(_) => Err("nested objects are not allowed".to_string()),
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || is_unspecified(trimmed) {
            None
        } else {
            Some(FieldValue::Text(trimmed.to_string()))
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Number(number) => Value::Number(number.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => number.as_f64(),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

fn is_unspecified(text: &str) -> bool {
    UNSPECIFIED_SENTINELS
        .iter()
        .any(|sentinel| text.eq_ignore_ascii_case(sentinel))
}

/// One extracted real-estate asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetRecord {
    values: BTreeMap<AssetField, FieldValue>,
}

impl AssetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from one decoded model object.
    ///
    /// Unknown keys are ignored. A record without an Asset Name, or with a
    /// nested object value, is rejected with `InvalidRecord`.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, ExtractError> {
        let mut record = AssetRecord::new();
        // Exact canonical keys take precedence over aliases.
        let mut exact = Vec::new();

        for (key, value) in object {
            let Some(field) = AssetField::from_key(key) else {
                debug!(key = key.as_str(), "ignoring unknown field in model output");
                continue;
            };
            let is_exact = key.trim() == field.as_str();
            if !is_exact && exact.contains(&field) {
                continue;
            }

            let parsed = FieldValue::from_json(value)
                .map_err(|reason| ExtractError::InvalidRecord(format!("field '{}': {}", key, reason)))?;
            match parsed {
                Some(value) => {
                    record.values.insert(field, value);
                }
                None if is_exact => {
                    record.values.remove(&field);
                }
                None => {}
            }
            if is_exact {
                exact.push(field);
            }
        }

        if record.asset_name().is_none() {
            return Err(ExtractError::InvalidRecord("missing Asset Name".to_string()));
        }

        Ok(record)
    }

    pub fn get(&self, field: AssetField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn set(&mut self, field: AssetField, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn with(mut self, field: AssetField, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn asset_name(&self) -> Option<String> {
        self.get(AssetField::AssetName).map(|value| value.to_string())
    }

    /// Key used to reconcile records of the same document.
    pub fn merge_key(&self) -> Option<String> {
        self.asset_name()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
    }

    pub fn filename(&self) -> Option<String> {
        self.get(AssetField::Filename).map(|value| value.to_string())
    }

    /// Overwrite Filename with the source document name.
    pub fn set_filename(&mut self, filename: &str) {
        self.set(AssetField::Filename, filename);
    }

    /// Number of populated fields.
    pub fn completeness(&self) -> usize {
        self.values.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (AssetField, &FieldValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Fill every absent field from `other`, keeping populated ones.
    pub fn fill_missing_from(&mut self, other: &AssetRecord) {
        for (field, value) in other.fields() {
            self.values.entry(field).or_insert_with(|| value.clone());
        }
    }

    pub fn to_json(&self) -> Value {
        let object = self
            .values
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), value.to_json()))
            .collect::<Map<String, Value>>();
        Value::Object(object)
    }
}

impl Serialize for AssetRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field.as_str(), &value.to_json())?;
        }
        map.end()
    }
}

/// A table detected on one page of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCandidate {
    /// 1-based page number the table was found on.
    pub page: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableCandidate {
    pub fn new(page: usize, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { page, columns, rows }
    }

    /// A table without columns or without rows carries no data.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }

    /// Whitespace-aligned rendering with a header line, one line per row.
    pub fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.columns.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; width];
        let lines = std::iter::once(&self.columns).chain(self.rows.iter());
        for line in lines.clone() {
            for (idx, cell) in line.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        lines
            .map(|line| {
                (0..width)
                    .map(|idx| {
                        let cell = line.get(idx).map(String::as_str).unwrap_or("");
                        format!("{:<w$}", cell, w = widths[idx])
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text and tables read from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocument {
    /// Page texts in reading order.
    pub pages: Vec<String>,
    pub tables: Vec<TableCandidate>,
}

impl ExtractedDocument {
    /// Page-concatenated text with a visible boundary between pages.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, text)| format!("Page {}\n{}", idx + 1, text))
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_field_names_are_canonical() {
        let names: Vec<&str> = AssetField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names.join(", "),
            "Asset Name, Filename, Delivery Date, City, Country, Start of Lease, \
             Lease Duration in Years, Seller, Tenant, GLA (Gross Leasable Area), IP-Rent, \
             Start of Contract"
        );
    }

    #[test]
    fn test_from_key_accepts_aliases() {
        assert_eq!(AssetField::from_key("asset name"), Some(AssetField::AssetName));
        assert_eq!(AssetField::from_key(" GLA "), Some(AssetField::Gla));
        assert_eq!(AssetField::from_key("IP Rent"), Some(AssetField::IpRent));
        assert_eq!(AssetField::from_key("Landlord"), None);
    }

    #[test]
    fn test_record_normalises_unspecified_values() {
        let record = AssetRecord::from_json_object(&object(json!({
            "Asset Name": "Athies",
            "City": "unspecified",
            "Country": null,
            "Seller": "",
            "GLA (Gross Leasable Area)": 6067,
            "Tenant": ["Perrenot", "Bekaert"],
        })))
        .unwrap();

        assert_eq!(record.completeness(), 3);
        assert_eq!(record.get(AssetField::City), None);
        assert_eq!(record.get(AssetField::Gla).and_then(FieldValue::as_f64), Some(6067.0));
        assert_eq!(
            record.get(AssetField::Tenant),
            Some(&FieldValue::Text("Perrenot, Bekaert".into()))
        );
    }

    #[test]
    fn test_record_requires_asset_name() {
        let err = AssetRecord::from_json_object(&object(json!({
            "Asset Name": "unspecified",
            "Tenant": "Acme",
        })))
        .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidRecord(_)));
    }

    #[test]
    fn test_record_rejects_nested_objects() {
        let err = AssetRecord::from_json_object(&object(json!({
            "Asset Name": "Unit A",
            "Tenant": {"name": "Acme"},
        })))
        .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidRecord(_)));
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        let record = AssetRecord::from_json_object(&object(json!({
            "GLA": "900",
            "Asset Name": "Unit A",
            "GLA (Gross Leasable Area)": "1200",
        })))
        .unwrap();
        assert_eq!(record.get(AssetField::Gla), Some(&FieldValue::Text("1200".into())));
    }

    #[test]
    fn test_record_serializes_with_canonical_keys() {
        let record = AssetRecord::new()
            .with(AssetField::AssetName, "Unit A")
            .with(AssetField::IpRent, 532849_i64);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Asset Name":"Unit A","IP-Rent":532849}"#);
    }

    #[test]
    fn test_table_render_keeps_every_cell() {
        let table = TableCandidate::new(
            2,
            vec!["Asset".into(), "Tenant".into()],
            vec![vec!["Cholet".into(), "Perrenot".into()], vec!["Valence".into()]],
        );
        let rendered = table.render();
        assert_eq!(rendered, "Asset    Tenant\nCholet   Perrenot\nValence");
    }

    #[test]
    fn test_full_text_marks_page_boundaries() {
        let doc = ExtractedDocument {
            pages: vec!["first".into(), "second".into()],
            tables: Vec::new(),
        };
        let text = doc.full_text();
        assert!(text.starts_with("Page 1\nfirst"));
        assert!(text.contains(PAGE_SEPARATOR));
        assert!(text.ends_with("Page 2\nsecond"));
    }
}
