use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::{
    error::AppResult,
    models::{ChannelDirectory, CoOccurrence, Recommendation},
    services::providers::Catalog,
};

/// Maximum number of recommendations returned
pub const RECOMMENDATION_LIMIT: usize = 3;

/// Ranks channels that co-occur with the user's favorite channels
///
/// For each favorite, the co-occurrence source is queried with the channel's
/// catalog id (or its name when the catalog does not know it). Partners that
/// point back at the favorite, resolve to any favorite, or are URLs are
/// dropped. The rest are grouped by display name with their visit counts
/// summed, ordered by total visits (ties by name) and cut to
/// [`RECOMMENDATION_LIMIT`].
///
/// Recommendations are advisory: if the source fails for any favorite, the
/// result is empty.
pub fn recommend<F>(
    favorites: &BTreeSet<String>,
    directory: &ChannelDirectory,
    mut co_occurrence: F,
) -> Vec<Recommendation>
where
    F: FnMut(&str) -> AppResult<Vec<CoOccurrence>>,
{
    if favorites.is_empty() {
        return Vec::new();
    }

    // name -> (first partner id seen, summed visits)
    let mut totals: HashMap<String, (String, u64)> = HashMap::new();

    for favorite in favorites {
        let identity = directory.id_of(favorite).unwrap_or(favorite);

        let partners = match co_occurrence(identity) {
            Ok(partners) => partners,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    channel = %favorite,
                    "Co-occurrence lookup failed, skipping recommendations"
                );
                return Vec::new();
            }
        };

        for partner in partners {
            if partner.partner_id == identity
                || partner.partner_id == *favorite
                || is_url(&partner.partner_id)
            {
                continue;
            }

            let name = display_name(directory, &partner);
            if favorites.contains(&name) {
                continue;
            }

            let entry = totals
                .entry(name)
                .or_insert_with(|| (partner.partner_id.clone(), 0));
            entry.1 += partner.visit_count;
        }
    }

    let mut recommendations: Vec<Recommendation> = totals
        .into_iter()
        .map(|(name, (source_id, visit_count))| Recommendation {
            name,
            source_id: Some(source_id),
            visit_count,
        })
        .collect();

    recommendations.sort_by(rank);
    recommendations.truncate(RECOMMENDATION_LIMIT);
    recommendations
}

/// Visit count descending, then name ascending
fn rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.visit_count
        .cmp(&a.visit_count)
        .then_with(|| a.name.cmp(&b.name))
}

fn is_url(id: &str) -> bool {
    id.starts_with("http")
}

/// Catalog name for the partner id, then the recorded name, then the raw id
fn display_name(directory: &ChannelDirectory, partner: &CoOccurrence) -> String {
    if let Some(name) = directory.name_of(&partner.partner_id) {
        return name.to_string();
    }

    match partner.partner_name.as_deref().map(str::trim) {
        Some(recorded) if !recorded.is_empty() => recorded.to_string(),
        _ => partner.partner_id.clone(),
    }
}

/// Computes channel recommendations for the given favorites from the catalog
///
/// Fetches the channel directory and every favorite's co-occurrence list, then
/// ranks them with [`recommend`]. Catalog failures degrade to an empty list.
pub async fn channel_recommendations(
    catalog: &dyn Catalog,
    favorites: &BTreeSet<String>,
) -> Vec<Recommendation> {
    if favorites.is_empty() {
        return Vec::new();
    }

    let directory = match catalog.channel_directory().await {
        Ok(directory) => directory,
        Err(e) => {
            tracing::warn!(error = %e, "Channel directory unavailable, no recommendations");
            return Vec::new();
        }
    };

    if directory.is_empty() {
        tracing::debug!("Channel directory is empty, partners keep their raw names");
    }

    // One lookup per favorite, consumed by `recommend` in the same order
    let mut fetched: VecDeque<AppResult<Vec<CoOccurrence>>> = VecDeque::new();
    for favorite in favorites {
        let identity = directory.id_of(favorite).unwrap_or(favorite);
        fetched.push_back(catalog.co_occurrence(identity).await);
    }

    let recommendations = recommend(favorites, &directory, |_| {
        fetched.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    });

    tracing::info!(
        favorites = favorites.len(),
        directory = directory.len(),
        recommendations = recommendations.len(),
        "Computed channel recommendations"
    );

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::providers::MockCatalog;
    use std::cell::Cell;

    fn favorites(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_empty_favorites_never_queries() {
        let calls = Cell::new(0);
        let recs = recommend(&favorites(&[]), &ChannelDirectory::new(), |_| {
            calls.set(calls.get() + 1);
            Ok(vec![CoOccurrence::new("Anything", 10)])
        });

        assert!(recs.is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_scenario_excludes_self_and_urls() {
        let recs = recommend(&favorites(&["ChannelX"]), &ChannelDirectory::new(), |channel| {
            assert_eq!(channel, "ChannelX");
            Ok(vec![
                CoOccurrence::new("ChannelY", 5),
                CoOccurrence::new("ChannelX", 9),
                CoOccurrence::new("http://x", 2),
            ])
        });

        assert_eq!(
            recs,
            vec![Recommendation {
                name: "ChannelY".to_string(),
                source_id: Some("ChannelY".to_string()),
                visit_count: 5,
            }]
        );
    }

    #[test]
    fn test_excludes_https_and_other_favorites() {
        let recs = recommend(&favorites(&["A", "B"]), &ChannelDirectory::new(), |channel| {
            Ok(match channel {
                "A" => vec![
                    CoOccurrence::new("B", 40),
                    CoOccurrence::new("https://youtube.com/@c", 30),
                    CoOccurrence::new("C", 1),
                ],
                _ => vec![CoOccurrence::new("A", 12)],
            })
        });

        assert_eq!(names(&recs), vec!["C"]);
    }

    #[test]
    fn test_sums_across_favorites_and_limits_to_three() {
        let recs = recommend(&favorites(&["A", "B"]), &ChannelDirectory::new(), |channel| {
            Ok(match channel {
                "A" => vec![
                    CoOccurrence::new("P", 3),
                    CoOccurrence::new("Q", 4),
                    CoOccurrence::new("R", 1),
                    CoOccurrence::new("S", 2),
                ],
                _ => vec![CoOccurrence::new("P", 3), CoOccurrence::new("R", 1)],
            })
        });

        assert_eq!(names(&recs), vec!["P", "Q", "R"]);
        assert_eq!(recs[0].visit_count, 6);
        assert_eq!(recs[1].visit_count, 4);
        // R (1 + 1) beats S (2) on name
        assert_eq!(recs[2].visit_count, 2);
    }

    #[test]
    fn test_ties_break_by_name() {
        let recs = recommend(&favorites(&["A"]), &ChannelDirectory::new(), |_| {
            Ok(vec![
                CoOccurrence::new("zeta", 5),
                CoOccurrence::new("Alpha", 5),
                CoOccurrence::new("beta", 5),
            ])
        });

        assert_eq!(names(&recs), vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_resolves_catalog_names_and_queries_by_id() {
        let mut directory = ChannelDirectory::new();
        directory.insert("UC-fav", "Favorite Show");
        directory.insert("UC-guest", "Guest Show");

        let recs = recommend(&favorites(&["Favorite Show"]), &directory, |channel| {
            assert_eq!(channel, "UC-fav");
            Ok(vec![
                CoOccurrence::new("UC-guest", 2).with_name("Dr. Guest"),
                CoOccurrence::new("UC-unknown", 3).with_name("Dr. Guest"),
                CoOccurrence::new("UC-fav", 50),
                CoOccurrence::new("UC-raw", 1),
            ])
        });

        assert_eq!(names(&recs), vec!["Dr. Guest", "Guest Show", "UC-raw"]);
        assert_eq!(recs[0].source_id.as_deref(), Some("UC-unknown"));
    }

    #[test]
    fn test_partner_resolving_to_favorite_name_is_excluded() {
        let mut directory = ChannelDirectory::new();
        directory.insert("UC-a", "A");
        directory.insert("UC-b", "B");

        let recs = recommend(&favorites(&["A", "B"]), &directory, |channel| {
            Ok(match channel {
                "UC-a" => vec![CoOccurrence::new("UC-b", 7), CoOccurrence::new("UC-c", 1)],
                _ => vec![CoOccurrence::new("other", 2).with_name("A")],
            })
        });

        assert_eq!(names(&recs), vec!["UC-c"]);
    }

    #[test]
    fn test_source_failure_yields_empty() {
        let recs = recommend(&favorites(&["A", "B"]), &ChannelDirectory::new(), |channel| {
            if channel == "B" {
                Err(AppError::CatalogUnavailable("connection refused".to_string()))
            } else {
                Ok(vec![CoOccurrence::new("C", 3)])
            }
        });

        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_channel_recommendations_uses_catalog() {
        let mut catalog = MockCatalog::new();
        catalog.expect_channel_directory().returning(|| {
            let mut directory = ChannelDirectory::new();
            directory.insert("UC1", "One");
            Ok(directory)
        });
        catalog
            .expect_co_occurrence()
            .withf(|id| id == "UC1")
            .times(1)
            .returning(|_| Ok(vec![CoOccurrence::new("UC2", 4).with_name("Two")]));

        let recs = channel_recommendations(&catalog, &favorites(&["One"])).await;
        assert_eq!(names(&recs), vec!["Two"]);
    }

    #[tokio::test]
    async fn test_favorites_sharing_an_identity_each_count() {
        let mut catalog = MockCatalog::new();
        catalog.expect_channel_directory().returning(|| {
            let mut directory = ChannelDirectory::new();
            directory.insert("UC1", "One");
            Ok(directory)
        });
        catalog
            .expect_co_occurrence()
            .withf(|id| id == "UC1")
            .times(2)
            .returning(|_| Ok(vec![CoOccurrence::new("UC2", 4).with_name("Two")]));

        // "UC1" is both a favorite name and the catalog id of "One"
        let recs = channel_recommendations(&catalog, &favorites(&["One", "UC1"])).await;
        assert_eq!(names(&recs), vec!["Two"]);
        assert_eq!(recs[0].visit_count, 8);
    }

    #[tokio::test]
    async fn test_channel_recommendations_directory_failure_is_empty() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_channel_directory()
            .returning(|| Err(AppError::CatalogUnavailable("down".to_string())));
        catalog.expect_co_occurrence().never();

        let recs = channel_recommendations(&catalog, &favorites(&["One"])).await;
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_channel_recommendations_skips_catalog_without_favorites() {
        let mut catalog = MockCatalog::new();
        catalog.expect_channel_directory().never();

        let recs = channel_recommendations(&catalog, &favorites(&[])).await;
        assert!(recs.is_empty());
    }
}
