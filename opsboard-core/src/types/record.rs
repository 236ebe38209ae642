//! Provider-agnostic inventory records and their aggregate.
//!
//! A [`Record`] is one item of inventory - a directory account, a droplet,
//! an EC2 instance, a registered domain. The aggregation core only depends
//! on the fields every provider can supply; everything provider-specific
//! rides along in the opaque `attrs` map.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OpsboardError, Result};

/// Source tag for the identity directory.
pub const SOURCE_DIRECTORY: &str = "directory";
/// Source tag for DigitalOcean droplets.
pub const SOURCE_DIGITALOCEAN: &str = "digitalocean";
/// Source tag for AWS EC2 instances.
pub const SOURCE_AWS: &str = "aws";
/// Source tag for GoDaddy domains.
pub const SOURCE_GODADDY: &str = "godaddy";

/// One provider-agnostic inventory item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    /// Provider-scoped identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Tag of the provider that produced this record.
    pub source: String,
    /// Mail/DNS domain the item belongs to, when it has one. Domain-filtered
    /// queries match against this field uniformly across providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Monthly cost in USD, when the provider bills the item monthly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,
    /// Provider-specific enrichment. Opaque to the aggregator and cache;
    /// typed views are recovered with [`Record::decode`].
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

impl Record {
    /// Creates a record with the mandatory fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: &'static str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            domain: None,
            monthly_cost: None,
            attrs: Map::new(),
        }
    }

    /// Sets the owning domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the monthly cost.
    pub fn with_monthly_cost(mut self, cost: f64) -> Self {
        self.monthly_cost = Some(cost);
        self
    }

    /// Adds one provider-specific attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Replaces the attribute map wholesale, typically with the serialized
    /// form of a typed provider item.
    pub fn with_attrs(mut self, attrs: Map<String, Value>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Recovers a typed view from the attribute map.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.attrs.clone())).map_err(OpsboardError::from)
    }

    /// Returns true if this record belongs to the given domain.
    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain.as_deref() == Some(domain)
    }
}

/// Merged result of one inventory query.
///
/// Transient: recomputed on every cache miss, never mutated after
/// construction. Item order is provider iteration order, then within-provider
/// order; never sorted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Aggregate {
    /// The merged records.
    pub items: Vec<Record>,
    /// Number of records.
    pub total: usize,
    /// Sum of the records' monthly costs; a missing cost contributes zero.
    pub monthly_cost: f64,
}

impl Aggregate {
    /// Builds an aggregate from merged records, deriving the summary fields.
    pub fn from_records(items: Vec<Record>) -> Self {
        let monthly_cost = items.iter().filter_map(|r| r.monthly_cost).sum();
        Self {
            total: items.len(),
            monthly_cost,
            items,
        }
    }

    /// The empty aggregate, used when every provider failed.
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }
}
