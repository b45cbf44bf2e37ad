use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the "who appears with whom" relation for a channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CoOccurrence {
    /// Identifier of the appearing channel (may be a catalog id or a raw URL)
    pub partner_id: String,
    /// Name recorded alongside the appearance, if any
    #[serde(default)]
    pub partner_name: Option<String>,
    pub visit_count: u64,
}

impl CoOccurrence {
    pub fn new(partner_id: impl Into<String>, visit_count: u64) -> Self {
        Self {
            partner_id: partner_id.into(),
            partner_name: None,
            visit_count,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.partner_name = Some(name.into());
        self
    }
}

/// A suggested channel, derived per request and never persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub name: String,
    pub source_id: Option<String>,
    pub visit_count: u64,
}

/// Catalog channel ids and names, used to resolve display names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    names_by_id: HashMap<String, String>,
    ids_by_name: HashMap<String, String>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a catalog channel
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        self.ids_by_name.entry(name.clone()).or_insert_with(|| id.clone());
        self.names_by_id.insert(id, name);
    }

    /// Catalog id for a channel name, if the catalog knows it
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.ids_by_name.get(name).map(String::as_str)
    }

    /// Catalog name for a channel id
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names_by_id.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }
}

impl FromIterator<(String, String)> for ChannelDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (id, name) in iter {
            directory.insert(id, name);
        }
        directory
    }
}
