use serde::{Deserialize, Serialize};

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::Cosine => "cosine",
            Distance::Euclid => "euclid",
            Distance::Dot => "dot",
        }
    }
}

/// Schema of a named collection. Exactly one dimension is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    name: String,
    dimension: usize,
    distance: Distance,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, dimension: usize, distance: Distance) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance,
        }
    }

    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self::new(name, dimension, Distance::Cosine)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}

/// What the index reports about an existing collection. The dimension is
/// `None` when the index uses a layout it cannot be read from (named vectors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: Option<usize>,
    pub distance: Option<Distance>,
}

/// Outcome of reconciling a collection against a requested dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "change")]
pub enum SchemaChange {
    Created,
    Recreated { previous: usize },
    Unchanged,
}
