//! Flattening of JMA forecast documents into per-area, per-time entries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::jma::models::{AreaSeries, ForecastBlock, ForecastDocument};
use crate::weather_code;

/// Rendering of a value the document does not carry.
pub const NO_DATA: &str = "情報なし";

/// How much of each ISO-8601 timestamp to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DDTHH:MM`
    #[default]
    Minute,
}

impl TimePrecision {
    #[must_use]
    pub fn truncate(self, timestamp: &str) -> &str {
        let len = match self {
            Self::Date => 10,
            Self::Minute => 16,
        };
        timestamp.get(..len).unwrap_or(timestamp)
    }
}

/// One row of forecast output. `None` fields mean "no data".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ForecastEntry {
    pub area_code: String,
    pub area_name: String,
    pub time: String,
    pub weather_code: Option<String>,
    pub weather_description: Option<String>,
    pub wind: Option<String>,
    pub wave: Option<String>,
}

impl ForecastEntry {
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.weather_description.is_some() || self.wind.is_some() || self.wave.is_some()
    }
}

/// Value for display, substituting [`NO_DATA`].
#[must_use]
pub fn or_no_data(value: Option<&str>) -> &str {
    value.unwrap_or(NO_DATA)
}

/// Parse and normalize a raw forecast document.
///
/// # Errors
///
/// `AppError::MalformedPayload` if the value is not an array of blocks that
/// each carry a `timeSeries` list.
pub fn normalize_value(
    document: serde_json::Value,
    precision: TimePrecision,
) -> AppResult<Vec<ForecastEntry>> {
    let document: ForecastDocument = serde_json::from_value(document)?;
    Ok(normalize(&document, precision))
}

/// Flatten every block of a forecast document.
///
/// Rows are grouped by area name in order of first appearance, then sorted
/// by time. Indices past the end of a per-area array read as no data; a row
/// with no weather, wind or wave is dropped.
#[must_use]
pub fn normalize(blocks: &[ForecastBlock], precision: TimePrecision) -> Vec<ForecastEntry> {
    let mut grouped: IndexMap<&str, Vec<ForecastEntry>> = IndexMap::new();

    for block in blocks {
        for series in &block.time_series {
            for area in &series.areas {
                let rows = grouped.entry(area.area.name.as_str()).or_default();
                rows.extend(
                    series
                        .time_defines
                        .iter()
                        .enumerate()
                        .filter_map(|(i, timestamp)| entry_at(area, i, precision.truncate(timestamp))),
                );
            }
        }
    }

    grouped
        .into_values()
        .flat_map(|mut rows| {
            rows.sort_by(|a, b| a.time.cmp(&b.time));
            rows
        })
        .collect()
}

/// Normalize only the short-term (first) block at date precision, keeping at
/// most `days` rows per area.
#[must_use]
pub fn normalize_short_term(blocks: &[ForecastBlock], days: usize) -> Vec<ForecastEntry> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };

    let mut kept: HashMap<String, usize> = HashMap::new();
    normalize(std::slice::from_ref(first), TimePrecision::Date)
        .into_iter()
        .filter(|entry| {
            let count = kept.entry(entry.area_name.clone()).or_default();
            *count += 1;
            *count <= days
        })
        .collect()
}

fn value_at(values: Option<&Vec<String>>, index: usize) -> Option<String> {
    values.and_then(|v| v.get(index)).cloned()
}

fn entry_at(area: &AreaSeries, index: usize, time: &str) -> Option<ForecastEntry> {
    let weather_code = value_at(area.weather_codes.as_ref(), index);
    let weather_description = value_at(area.weathers.as_ref(), index).or_else(|| {
        weather_code
            .as_deref()
            .map(|code| weather_code::translate(code).to_string())
    });

    let entry = ForecastEntry {
        area_code: area.area.code.clone(),
        area_name: area.area.name.clone(),
        time: time.to_string(),
        weather_code,
        weather_description,
        wind: value_at(area.winds.as_ref(), index),
        wave: value_at(area.waves.as_ref(), index),
    };

    entry.has_data().then_some(entry)
}
