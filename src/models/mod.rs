use serde::Serialize;

pub mod preferences;
pub mod recommendation;
pub mod testing_result;

pub use preferences::{toggle_member, PreferenceList, Preferences, PubmedFilter};
pub use recommendation::{ChannelDirectory, CoOccurrence, Recommendation};
pub use testing_result::{SortColumn, SortDirection, SortState, SortValue, TestingResult};

/// Favorites that still exist in the catalog, in catalog order
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Favorites {
    pub channels: Vec<String>,
    pub solutions: Vec<String>,
}

/// A testing result row as rendered by the results table
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestingResultRow {
    #[serde(flatten)]
    pub result: TestingResult,
    pub out_of_range: bool,
}

impl From<TestingResult> for TestingResultRow {
    fn from(result: TestingResult) -> Self {
        let out_of_range = result.is_out_of_range();
        Self {
            result,
            out_of_range,
        }
    }
}

/// Chart series for a single testing object
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightSeries {
    pub success: bool,
    pub x_values: Vec<String>,
    pub y_values: Vec<f64>,
    pub unit_label: Option<String>,
    pub reference_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_row_flattens_result_fields() {
        let result = TestingResult {
            id: 7,
            test_object: "Ferritin".to_string(),
            normalized_test_object: None,
            result_value: Some(410.0),
            result_unit: Some("ng/mL".to_string()),
            reference_value: Some(300.0),
            comments: None,
            flag: Some("High".to_string()),
            testing_date: None,
            testing_institution: None,
            testing_location: None,
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(TestingResultRow::from(result)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["testObject"], "Ferritin");
        assert_eq!(json["outOfRange"], true);
    }

    #[test]
    fn test_insight_series_omits_empty_message() {
        let series = InsightSeries {
            success: true,
            x_values: vec!["2024-01-01".to_string()],
            y_values: vec![1.0],
            unit_label: None,
            reference_value: None,
            message: None,
        };
        let json = serde_json::to_value(&series).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["xValues"][0], "2024-01-01");
    }
}
