use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::AppError;

/// One measured quantity from a lab report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TestingResult {
    pub id: i64,
    pub test_object: String,
    pub normalized_test_object: Option<String>,
    pub result_value: Option<f64>,
    pub result_unit: Option<String>,
    pub reference_value: Option<f64>,
    pub comments: Option<String>,
    pub flag: Option<String>,
    pub testing_date: Option<NaiveDate>,
    pub testing_institution: Option<String>,
    pub testing_location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TestingResult {
    /// Name used for filtering: the normalized form when known
    pub fn display_object(&self) -> &str {
        self.normalized_test_object
            .as_deref()
            .unwrap_or(&self.test_object)
    }

    /// True when the lab flagged the value as high or low
    pub fn is_out_of_range(&self) -> bool {
        self.flag
            .as_deref()
            .map(|f| {
                let f = f.trim();
                f.eq_ignore_ascii_case("high") || f.eq_ignore_ascii_case("low")
            })
            .unwrap_or(false)
    }

    /// Date the sample was taken, falling back to when the row was last written
    pub fn effective_date(&self) -> NaiveDate {
        self.testing_date
            .unwrap_or_else(|| self.updated_at.date_naive())
    }

    /// Typed value of a column, `None` when the row has no value there
    pub fn sort_value(&self, column: SortColumn) -> Option<SortValue<'_>> {
        match column {
            SortColumn::Id => Some(SortValue::Integer(self.id)),
            SortColumn::TestObject => Some(SortValue::Text(&self.test_object)),
            SortColumn::ResultValue => self.result_value.map(SortValue::Number),
            SortColumn::ResultUnit => self.result_unit.as_deref().map(SortValue::Text),
            SortColumn::ReferenceValue => self.reference_value.map(SortValue::Number),
            SortColumn::Comments => self.comments.as_deref().map(SortValue::Text),
            SortColumn::Flag => self.flag.as_deref().map(SortValue::Text),
            SortColumn::TestingDate => self.testing_date.map(SortValue::Date),
            SortColumn::TestingInstitution => {
                self.testing_institution.as_deref().map(SortValue::Text)
            }
            SortColumn::TestingLocation => self.testing_location.as_deref().map(SortValue::Text),
            SortColumn::UpdatedAt => Some(SortValue::Timestamp(self.updated_at)),
        }
    }
}

/// A comparable column value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Integer(i64),
    Number(f64),
    Text(&'a str),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SortValue<'_> {
    /// Natural order within one column; values of one column always share a variant
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Integer(a), SortValue::Integer(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Timestamp(a), SortValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Columns a result table can be ordered by
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Id,
    TestObject,
    ResultValue,
    ResultUnit,
    ReferenceValue,
    Comments,
    Flag,
    TestingDate,
    TestingInstitution,
    TestingLocation,
    #[default]
    UpdatedAt,
}

impl FromStr for SortColumn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "test_object" => Ok(Self::TestObject),
            "result_value" => Ok(Self::ResultValue),
            "result_unit" => Ok(Self::ResultUnit),
            "reference_value" => Ok(Self::ReferenceValue),
            "comments" => Ok(Self::Comments),
            "flag" => Ok(Self::Flag),
            "testing_date" => Ok(Self::TestingDate),
            "testing_institution" => Ok(Self::TestingInstitution),
            "testing_location" => Ok(Self::TestingLocation),
            "updated_at" => Ok(Self::UpdatedAt),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported sort column: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(AppError::InvalidInput(format!(
                "Unsupported sort direction: {}",
                s
            )))
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Active column and direction of a result table
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Header click: the active column flips direction, a new column starts ascending
    pub fn select(self, column: SortColumn) -> Self {
        if column == self.column {
            Self::new(column, self.direction.flipped())
        } else {
            Self::new(column, SortDirection::Asc)
        }
    }
}
