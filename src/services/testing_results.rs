use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::models::{InsightSeries, SortColumn, SortDirection, TestingResult};

/// Filters results to the selected testing objects and orders them
///
/// An empty selection keeps every row. Rows are matched on their normalized
/// object name, falling back to the raw name. Sorting is stable; rows without
/// a value in `column` go last whichever direction is requested.
pub fn filter_and_sort(
    results: Vec<TestingResult>,
    selected: &BTreeSet<String>,
    column: SortColumn,
    direction: SortDirection,
) -> Vec<TestingResult> {
    let mut rows: Vec<TestingResult> = if selected.is_empty() {
        results
    } else {
        results
            .into_iter()
            .filter(|r| selected.contains(r.display_object()))
            .collect()
    };

    rows.sort_by(|a, b| compare_rows(a, b, column, direction));
    rows
}

fn compare_rows(
    a: &TestingResult,
    b: &TestingResult,
    column: SortColumn,
    direction: SortDirection,
) -> Ordering {
    match (a.sort_value(column), b.sort_value(column)) {
        (Some(x), Some(y)) => {
            let ordering = x.compare(&y);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct testing object names present in the results, sorted
pub fn available_objects(results: &[TestingResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.display_object().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the chart series for one testing object
///
/// Only rows with a numeric value are plotted, oldest first. The unit label and
/// reference value come from the most recent row that carries one.
pub fn insight_series(results: &[TestingResult], testing_object: &str) -> InsightSeries {
    let mut points: Vec<&TestingResult> = results
        .iter()
        .filter(|r| r.display_object() == testing_object && r.result_value.is_some())
        .collect();

    if points.is_empty() {
        return InsightSeries {
            success: false,
            x_values: Vec::new(),
            y_values: Vec::new(),
            unit_label: None,
            reference_value: None,
            message: Some(format!(
                "No numeric results found for testing object '{}'",
                testing_object
            )),
        };
    }

    points.sort_by(|a, b| {
        a.effective_date()
            .cmp(&b.effective_date())
            .then_with(|| a.updated_at.cmp(&b.updated_at))
    });

    let unit_label = points.iter().rev().find_map(|r| r.result_unit.clone());
    let reference_value = points.iter().rev().find_map(|r| r.reference_value);

    let units: HashSet<&str> = points
        .iter()
        .filter_map(|r| r.result_unit.as_deref())
        .collect();
    if units.len() > 1 {
        tracing::warn!(
            testing_object = %testing_object,
            units = units.len(),
            "Testing object reported in mixed units"
        );
    }

    InsightSeries {
        success: true,
        x_values: points
            .iter()
            .map(|r| r.effective_date().format("%Y-%m-%d").to_string())
            .collect(),
        y_values: points.iter().filter_map(|r| r.result_value).collect(),
        unit_label,
        reference_value,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn row(id: i64, object: &str, value: Option<f64>, date: Option<(i32, u32, u32)>) -> TestingResult {
        TestingResult {
            id,
            test_object: object.to_string(),
            normalized_test_object: None,
            result_value: value,
            result_unit: Some("ng/mL".to_string()),
            reference_value: None,
            comments: None,
            flag: None,
            testing_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            testing_institution: None,
            testing_location: None,
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(id),
        }
    }

    fn sample() -> Vec<TestingResult> {
        vec![
            row(1, "Ferritin", Some(120.0), Some((2023, 5, 1))),
            row(2, "Vitamin D", None, Some((2022, 1, 10))),
            row(3, "Ferritin", Some(95.5), None),
            row(4, "B12", Some(410.0), Some((2024, 2, 2))),
            row(5, "Vitamin D", Some(28.0), Some((2021, 9, 9))),
        ]
    }

    fn ids(rows: &[TestingResult]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    fn selection(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_keeps_every_row() {
        let sorted = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::Id, SortDirection::Desc);
        assert_eq!(ids(&sorted), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_selection_uses_normalized_name() {
        let mut results = sample();
        results[3].normalized_test_object = Some("Vitamin B12".to_string());

        let filtered = filter_and_sort(
            results,
            &selection(&["Vitamin B12", "Ferritin"]),
            SortColumn::Id,
            SortDirection::Asc,
        );
        assert_eq!(ids(&filtered), vec![1, 3, 4]);
    }

    #[test]
    fn test_raw_name_is_ignored_once_normalized() {
        let mut results = sample();
        results[3].normalized_test_object = Some("Vitamin B12".to_string());

        let filtered = filter_and_sort(results, &selection(&["B12"]), SortColumn::Id, SortDirection::Asc);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_missing_values_sort_last_both_directions() {
        let asc = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::TestingDate, SortDirection::Asc);
        assert_eq!(ids(&asc), vec![5, 2, 1, 4, 3]);

        let desc = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::TestingDate, SortDirection::Desc);
        assert_eq!(ids(&desc), vec![4, 1, 2, 5, 3]);

        let by_value = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::ResultValue, SortDirection::Desc);
        assert_eq!(by_value.last().map(|r| r.id), Some(2));
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let sorted = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::ResultValue, SortDirection::Asc);
        assert_eq!(ids(&sorted), vec![5, 3, 1, 4, 2]);
    }

    #[test]
    fn test_reverse_of_ascending_is_descending_without_ties() {
        let selected = selection(&["Ferritin", "B12", "Vitamin D"]);
        let mut asc = filter_and_sort(sample(), &selected, SortColumn::UpdatedAt, SortDirection::Asc);
        let desc = filter_and_sort(sample(), &selected, SortColumn::UpdatedAt, SortDirection::Desc);
        asc.reverse();
        assert_eq!(ids(&asc), ids(&desc));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let sorted = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::TestObject, SortDirection::Asc);
        assert_eq!(ids(&sorted), vec![4, 1, 3, 2, 5]);

        let sorted = filter_and_sort(sample(), &BTreeSet::new(), SortColumn::TestObject, SortDirection::Desc);
        assert_eq!(ids(&sorted), vec![2, 5, 1, 3, 4]);
    }

    #[test]
    fn test_available_objects_are_distinct_and_sorted() {
        let mut results = sample();
        results[0].normalized_test_object = Some("Ferritin".to_string());
        assert_eq!(available_objects(&results), vec!["B12", "Ferritin", "Vitamin D"]);
    }

    #[test]
    fn test_insight_series_orders_chronologically() {
        let mut results = sample();
        results[0].reference_value = Some(300.0);

        let series = insight_series(&results, "Ferritin");
        assert!(series.success);
        // row 3 has no testing date and falls back to its 2024-06-01 update
        assert_eq!(series.x_values, vec!["2023-05-01", "2024-06-01"]);
        assert_eq!(series.y_values, vec![120.0, 95.5]);
        assert_eq!(series.unit_label.as_deref(), Some("ng/mL"));
        assert_eq!(series.reference_value, Some(300.0));
    }

    #[test]
    fn test_insight_series_skips_rows_without_value() {
        let series = insight_series(&sample(), "Vitamin D");
        assert_eq!(series.y_values, vec![28.0]);
    }

    #[test]
    fn test_insight_series_unknown_object() {
        let series = insight_series(&sample(), "Cortisol");
        assert!(!series.success);
        assert!(series.x_values.is_empty());
        assert!(series.message.unwrap().contains("Cortisol"));
    }
}
