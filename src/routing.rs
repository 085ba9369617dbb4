use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::RoutingError;

/// Identifier of the downstream consumer that will process enqueued rows.
/// Only ever produced by a [`RoutingTable`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub i64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The (location, data type, tester type) triple a submission routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingKey {
    pub location: String,
    pub data_type: String,
    pub tester_type: String,
}

impl RoutingKey {
    pub fn new(
        location: impl Into<String>,
        data_type: impl Into<String>,
        tester_type: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            data_type: data_type.into(),
            tester_type: tester_type.into(),
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.location, self.data_type, self.tester_type
        )
    }
}

/// Static three-level mapping location -> data type -> tester type -> sender id.
/// Built once from configuration and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<String, BTreeMap<String, BTreeMap<String, SenderId>>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: RoutingKey, sender_id: SenderId) {
        self.routes
            .entry(key.location)
            .or_default()
            .entry(key.data_type)
            .or_default()
            .insert(key.tester_type, sender_id);
    }

    /// Exact-match, case-sensitive lookup on all three key parts.
    /// A miss at any level is the same `NotFound` outcome carrying the full key.
    pub fn resolve(&self, key: &RoutingKey) -> Result<SenderId, RoutingError> {
        self.routes
            .get(&key.location)
            .and_then(|data_types| data_types.get(&key.data_type))
            .and_then(|tester_types| tester_types.get(&key.tester_type))
            .copied()
            .ok_or_else(|| RoutingError::NotFound {
                location: key.location.clone(),
                data_type: key.data_type.clone(),
                tester_type: key.tester_type.clone(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
