use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TEXT_SEPARATOR: &str = ". ";

/// Identifier of a relational row as delivered by the source.
///
/// Integers and strings are the expected shapes; anything else (floats,
/// booleans, structures) is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Integer(i64),
    Text(String),
    Other(Value),
}

impl RecordId {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(RecordId::Text(s)),
            Value::Number(n) if n.is_i64() => n.as_i64().map(RecordId::Integer),
            other => Some(RecordId::Other(other)),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Integer(i) => Value::from(*i),
            RecordId::Text(s) => Value::String(s.clone()),
            RecordId::Other(v) => v.clone(),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Integer(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Integer(i) => write!(f, "{}", i),
            RecordId::Text(s) => write!(f, "{}", s),
            RecordId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// A company row fetched from the relational source. Immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: Option<RecordId>,
    name: Option<Value>,
    website: Option<Value>,
    size: Option<Value>,
    description: Option<Value>,
    addresses: Option<Value>,
    industries: Option<Value>,
}

impl Record {
    pub fn new(id: Option<RecordId>) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Builds a record from a raw row map. `id` takes precedence over the
    /// legacy `company_id` column.
    pub fn from_row(mut row: Map<String, Value>) -> Self {
        let id = row
            .remove("id")
            .and_then(RecordId::from_value)
            .or_else(|| row.remove("company_id").and_then(RecordId::from_value));

        Self {
            id,
            name: row.remove("name"),
            website: row.remove("website"),
            size: row.remove("size"),
            description: row.remove("description"),
            addresses: row.remove("addresses"),
            industries: row.remove("industries"),
        }
    }

    pub fn with_name(mut self, name: impl Into<Value>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<Value>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<Value>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<Value>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_addresses(mut self, addresses: impl Into<Value>) -> Self {
        self.addresses = Some(addresses.into());
        self
    }

    pub fn with_industries(mut self, industries: impl Into<Value>) -> Self {
        self.industries = Some(industries.into());
        self
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> Option<&Value> {
        self.name.as_ref()
    }

    /// Text used as embedding input. Absent fields are omitted entirely.
    pub fn descriptive_text(&self) -> String {
        let labelled = [
            ("Company name", &self.name),
            ("Website", &self.website),
            ("Company size", &self.size),
            ("Description", &self.description),
            ("Locations", &self.addresses),
            ("Industries", &self.industries),
        ];

        let parts: Vec<String> = labelled
            .iter()
            .filter_map(|(label, value)| {
                value
                    .as_ref()
                    .and_then(render_field)
                    .map(|rendered| format!("{}: {}", label, rendered))
            })
            .collect();

        parts.join(TEXT_SEPARATOR).trim().to_string()
    }

    /// Payload stored alongside the vector.
    pub fn payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "id".to_string(),
            self.id.as_ref().map(RecordId::to_value).unwrap_or(Value::Null),
        );
        for (key, value) in [
            ("name", &self.name),
            ("website", &self.website),
            ("size", &self.size),
            ("description", &self.description),
            ("addresses", &self.addresses),
            ("industries", &self.industries),
        ] {
            map.insert(key.to_string(), value.clone().unwrap_or(Value::Null));
        }
        map
    }
}

/// Renders a field value, or `None` when the value counts as absent
/// (null, empty, `false` or zero).
fn render_field(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().filter_map(render_field).collect();
            if rendered.is_empty() {
                None
            } else {
                Some(rendered.join(", "))
            }
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.to_string()),
    }
}
