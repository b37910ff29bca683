use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Response from `common/const/area.json`.
///
/// Only `centers` and `offices` are required; a body without them is not a
/// catalog. Section maps keep the order JMA sends them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaCatalog {
    pub centers: IndexMap<String, CenterRecord>,
    pub offices: IndexMap<String, OfficeRecord>,
    #[serde(default)]
    pub class10s: IndexMap<String, Class10Record>,
}

/// Regional center, e.g. "関東甲信地方".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterRecord {
    pub name: String,
    #[serde(default)]
    pub en_name: Option<String>,
    #[serde(default)]
    pub office_name: Option<String>,
    /// Office ids
    #[serde(default)]
    pub children: Vec<String>,
}

/// Forecast office, roughly one per prefecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeRecord {
    pub name: String,
    #[serde(default)]
    pub en_name: Option<String>,
    #[serde(default)]
    pub office_name: Option<String>,
    /// Center id
    #[serde(default)]
    pub parent: Option<String>,
    /// Class10 area ids
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class10Record {
    pub name: String,
    #[serde(default)]
    pub en_name: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Response from `forecast/data/forecast/{code}.json`: short-term block first,
/// weekly block second.
pub type ForecastDocument = Vec<ForecastBlock>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastBlock {
    #[serde(default)]
    pub publishing_office: Option<String>,
    #[serde(default)]
    pub report_datetime: Option<String>,
    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    #[serde(default)]
    pub time_defines: Vec<String>,
    #[serde(default)]
    pub areas: Vec<AreaSeries>,
}

/// Per-area arrays, each aligned by index to `TimeSeries::time_defines` but
/// possibly shorter. Other series (pops, temps) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSeries {
    pub area: AreaRef,
    #[serde(default)]
    pub weathers: Option<Vec<String>>,
    #[serde(default)]
    pub weather_codes: Option<Vec<String>>,
    #[serde(default)]
    pub winds: Option<Vec<String>>,
    #[serde(default)]
    pub waves: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaRef {
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keeps_jma_key_order() {
        let catalog: AreaCatalog = serde_json::from_str(
            r#"{
                "centers": {
                    "010300": {"name": "関東甲信地方", "enName": "Kanto Koshin", "children": ["130000"]},
                    "010100": {"name": "北海道地方", "children": []}
                },
                "offices": {"130000": {"name": "東京都", "parent": "010300", "children": ["130010"]}},
                "class10s": {"130010": {"name": "東京地方", "parent": "130000"}}
            }"#,
        )
        .unwrap();

        let ids: Vec<&str> = catalog.centers.keys().map(String::as_str).collect();
        assert_eq!(ids, ["010300", "010100"]);
        assert_eq!(catalog.offices["130000"].parent.as_deref(), Some("010300"));
        assert_eq!(catalog.centers["010300"].en_name.as_deref(), Some("Kanto Koshin"));
    }

    #[test]
    fn catalog_without_offices_is_rejected() {
        let result = serde_json::from_str::<AreaCatalog>(r#"{"centers": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn forecast_area_arrays_are_optional() {
        let doc: ForecastDocument = serde_json::from_str(
            r#"[{"timeSeries": [{
                "timeDefines": ["2024-01-01T00:00:00+09:00"],
                "areas": [{"area": {"name": "東京地方", "code": "130010"}, "pops": ["10"]}]
            }]}]"#,
        )
        .unwrap();

        let area = &doc[0].time_series[0].areas[0];
        assert!(area.weathers.is_none());
        assert!(area.weather_codes.is_none());
        assert_eq!(area.area.code, "130010");
    }
}
