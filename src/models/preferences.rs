use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::error::AppError;

/// Adds `item` when absent, removes it when present
///
/// Applying the same toggle twice yields the original set.
pub fn toggle_member(set: &BTreeSet<String>, item: &str) -> BTreeSet<String> {
    let mut toggled = set.clone();
    if !toggled.remove(item) {
        toggled.insert(item.to_string());
    }
    toggled
}

/// Reads an explicit `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// PubMed study filter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PubmedFilter {
    /// Earliest publication date, inclusive
    pub start_date: Option<NaiveDate>,
    /// Latest publication date, inclusive
    pub end_date: Option<NaiveDate>,
    /// Accepted publication types (e.g. "Randomized Controlled Trial")
    #[serde(deserialize_with = "null_as_default")]
    pub publication_types: BTreeSet<String>,
}

impl PubmedFilter {
    /// True when any of the dates or publication types is set
    pub fn is_active(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some() || !self.publication_types.is_empty()
    }
}

/// The user's preferences document
///
/// Persisted wholesale; every toggle produces a new document that replaces the
/// stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(deserialize_with = "null_as_default")]
    pub favorite_channels: BTreeSet<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub favorite_solutions: BTreeSet<String>,
    #[serde(alias = "pubmedPreferences", deserialize_with = "null_as_default")]
    pub pubmed_filter: PubmedFilter,
    #[serde(deserialize_with = "null_as_default")]
    pub selected_testing_objects: BTreeSet<String>,
}

/// Which membership set a toggle applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceList {
    FavoriteChannels,
    FavoriteSolutions,
    PublicationTypes,
    TestingObjects,
}

impl Preferences {
    /// Creates empty preferences
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `item` toggled in the selected list
    pub fn toggled(&self, list: PreferenceList, item: &str) -> Self {
        let mut next = self.clone();
        match list {
            PreferenceList::FavoriteChannels => {
                next.favorite_channels = toggle_member(&self.favorite_channels, item);
            }
            PreferenceList::FavoriteSolutions => {
                next.favorite_solutions = toggle_member(&self.favorite_solutions, item);
            }
            PreferenceList::PublicationTypes => {
                next.pubmed_filter.publication_types =
                    toggle_member(&self.pubmed_filter.publication_types, item);
            }
            PreferenceList::TestingObjects => {
                next.selected_testing_objects =
                    toggle_member(&self.selected_testing_objects, item);
            }
        }
        next
    }

    /// Returns a copy with both PubMed date bounds replaced
    pub fn with_pubmed_dates(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, AppError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::InvalidInput(format!(
                    "Start date {} is after end date {}",
                    start, end
                )));
            }
        }

        let mut next = self.clone();
        next.pubmed_filter.start_date = start_date;
        next.pubmed_filter.end_date = end_date;
        Ok(next)
    }
}
