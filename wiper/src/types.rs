//! Value types shared by the stores, the drain loop and the orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use crate::bail;
use crate::error::{ErrorKind, WipeResult};

/// Name of a remote table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TableName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Scalar value usable as a key attribute.
///
/// Numbers keep the store's decimal string representation so no precision is lost on the
/// round trip from scan to delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::String(value) => f.write_str(value),
            KeyValue::Number(value) => f.write_str(value),
            KeyValue::Binary(value) => write!(f, "<{} bytes>", value.len()),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Number(value.to_string())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Number(value.to_string())
    }
}

impl From<u64> for KeyValue {
    fn from(value: u64) -> Self {
        KeyValue::Number(value.to_string())
    }
}

/// Primary key of a single record: the key attribute name and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    pub attribute: String,
    pub value: KeyValue,
}

impl PrimaryKey {
    pub fn new(attribute: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.value)
    }
}

/// A record returned by a scan.
///
/// Only the primary key attribute is ever inspected. Attributes whose type cannot act as a key
/// are dropped by the stores when building a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    attributes: BTreeMap<String, KeyValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, replacing any previous value with the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, KeyValue> {
        &self.attributes
    }

    /// Extracts the primary key stored under `attribute`.
    pub fn primary_key(&self, attribute: &str) -> WipeResult<PrimaryKey> {
        let Some(value) = self.attributes.get(attribute) else {
            bail!(
                ErrorKind::MissingPrimaryKey,
                "Scanned record has no primary key attribute",
                format!("attribute `{attribute}` missing from record")
            );
        };

        Ok(PrimaryKey {
            attribute: attribute.to_string(),
            value: value.clone(),
        })
    }
}

impl FromIterator<(String, KeyValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, KeyValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// Opaque continuation marker returned by a truncated scan.
///
/// Holds the key of the last record evaluated, which is where the next scan resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(pub(crate) BTreeMap<String, KeyValue>);

/// Parameters of a single scan request.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Attribute to read from every record. Stores may return more.
    pub key_attribute: String,
    /// Page size. `None` lets the store decide.
    pub limit: Option<u32>,
    /// Where to resume, `None` to start at the beginning of the table.
    pub start_token: Option<PageToken>,
}

/// One page of scan results.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub records: Vec<Record>,
    /// Present when the store has more to return.
    pub next_token: Option<PageToken>,
}
