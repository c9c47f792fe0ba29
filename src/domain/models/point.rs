use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::RecordId;

/// Identifier of a point inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Integer(i64),
    Text(String),
}

impl PointId {
    /// Maps a record id onto a point id.
    ///
    /// Empty or whitespace-only strings get a fresh UUID; integers and other
    /// strings pass through; any other type is coerced to its string form.
    /// Only blank strings are replaced: a missing id is filtered out before
    /// this point and is never turned into a generated one.
    pub fn from_record_id(id: &RecordId) -> Self {
        match id {
            RecordId::Integer(i) => PointId::Integer(*i),
            RecordId::Text(s) if s.trim().is_empty() => PointId::Text(Uuid::new_v4().to_string()),
            RecordId::Text(s) => PointId::Text(s.clone()),
            RecordId::Other(value) => PointId::Text(value.to_string()),
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Integer(i) => write!(f, "{}", i),
            PointId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One indexed unit: identifier, vector and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: PointId,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

impl Point {
    pub fn new(id: PointId, vector: Vec<f32>, payload: Map<String, Value>) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }

    pub fn id(&self) -> &PointId {
        &self.id
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// A point returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Map<String, Value>,
}

impl ScoredPoint {
    pub fn new(id: PointId, score: f32, payload: Map<String, Value>) -> Self {
        Self { id, score, payload }
    }

    pub fn id(&self) -> &PointId {
        &self.id
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}
