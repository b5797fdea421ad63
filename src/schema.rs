//! Schema registry for the timesheet import: the ordered set of business
//! fields, their type tags, and their load policies.
//!
//! The registry is the positional contract with the raw CSV. Column order in
//! the file binds to fields by position alone; header text in the file is
//! never consulted. The registry is an immutable configuration value handed
//! to every component, which keeps alternate schemas (smaller test layouts,
//! future exports) a matter of constructing a different [`ImportSchema`].
//!
//! Registries round-trip through YAML with `serde_yaml`, so a deployment can
//! pin its layout in a reviewable file rather than in code.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::data::normalize_column_name;

pub const BATCH_ID_COLUMN: &str = "batch_id";
pub const SOURCE_FILE_COLUMN: &str = "original_file_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Date,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["text", "integer", "float", "date"]
    }

    /// SQL column affinity used when the target table is created.
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Date => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "REAL",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "text" | "string" => Ok(FieldType::Text),
            "integer" | "int" => Ok(FieldType::Integer),
            "float" | "double" => Ok(FieldType::Float),
            "date" => Ok(FieldType::Date),
            _ => Err(anyhow!(
                "Unknown field type '{value}'. Supported types: {}",
                FieldType::variants().join(", ")
            )),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        FieldType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub datatype: FieldType,
    /// Rows missing this field cannot be deduplicated or loaded and are
    /// filtered out of the batch.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// The persisted column admits NULL; everything else is NOT NULL.
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    /// Categorical business rule for TYPE and COST_TYPE: force into
    /// {valid integer, default 1} regardless of the declared type tag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub default_one: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl FieldDef {
    fn new(name: &str, datatype: FieldType) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            required: false,
            nullable: false,
            default_one: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn default_one(mut self) -> Self {
        self.default_one = true;
        self
    }

    /// SQL identifier for the persisted column.
    pub fn column_name(&self) -> String {
        normalize_column_name(&self.name)
    }
}

/// Ordered registry of business fields. Order is significant: it is the
/// positional contract with the raw CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSchema {
    pub fields: Vec<FieldDef>,
}

impl ImportSchema {
    /// The built-in 14-field timesheet registry.
    pub fn timesheet() -> Self {
        Self {
            fields: vec![
                FieldDef::new("EMP", FieldType::Text).required(),
                FieldDef::new("TYPE", FieldType::Integer).default_one(),
                FieldDef::new("UNITS", FieldType::Float),
                FieldDef::new("HOURS", FieldType::Float),
                FieldDef::new("DATE", FieldType::Date).required(),
                FieldDef::new("JOB", FieldType::Text).required(),
                FieldDef::new("PHASE", FieldType::Text).required(),
                FieldDef::new("CAT", FieldType::Text),
                FieldDef::new("EQUIP_NUM", FieldType::Text).nullable(),
                FieldDef::new("EQUIP_CODE", FieldType::Text).nullable(),
                FieldDef::new("EQUIP_HRS", FieldType::Float).nullable(),
                FieldDef::new("WORK_TYPE", FieldType::Integer),
                FieldDef::new("COST_TYPE", FieldType::Integer).default_one(),
                FieldDef::new("EQ_DATE", FieldType::Date).nullable(),
            ],
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Positions of the required-key fields, in registry order.
    pub fn required_indexes(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.required)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Positions participating in the duplicate match: every business field
    /// whose type is not float. Exact floating-point equality across
    /// re-exports is unreliable, so float fields never key the match.
    pub fn dedup_indexes(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.datatype != FieldType::Float)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.fields.is_empty(), "Schema declares no fields");
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            ensure!(
                !field.name.trim().is_empty(),
                "Schema contains a field with an empty name"
            );
            if !seen.insert(field.column_name()) {
                bail!(
                    "Schema contains duplicate column '{}' after name normalization",
                    field.name
                );
            }
        }
        ensure!(
            self.fields.iter().any(|f| f.required),
            "Schema declares no required fields; every row would load"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: ImportSchema =
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }
}
