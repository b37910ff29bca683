//! Region → prefecture → date drill-down as pure state transitions.
//!
//! A transition never performs I/O: it returns the next state together with
//! a description of the data the caller has to load for it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NavigationState {
    pub region_id: Option<String>,
    pub prefecture_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NavigationEvent {
    SelectRegion(String),
    SelectPrefecture(String),
    SelectDate(String),
}

/// Data the caller must load after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fetch {
    PrefectureList { region_id: String },
    DatesAndAreas { prefecture_id: String },
    Forecast { prefecture_id: String, date: String },
}

/// Apply `event` to `state`.
///
/// # Errors
///
/// `AppError::BadRequest` for an empty id, or for `SelectDate` before a
/// prefecture has been selected.
pub fn transition(state: &NavigationState, event: NavigationEvent) -> AppResult<(NavigationState, Fetch)> {
    match event {
        NavigationEvent::SelectRegion(region_id) => {
            let region_id = non_empty(region_id, "region")?;
            Ok((
                NavigationState {
                    region_id: Some(region_id.clone()),
                    prefecture_id: None,
                    date: None,
                },
                Fetch::PrefectureList { region_id },
            ))
        }
        NavigationEvent::SelectPrefecture(prefecture_id) => {
            let prefecture_id = non_empty(prefecture_id, "prefecture")?;
            Ok((
                NavigationState {
                    region_id: state.region_id.clone(),
                    prefecture_id: Some(prefecture_id.clone()),
                    date: None,
                },
                Fetch::DatesAndAreas { prefecture_id },
            ))
        }
        NavigationEvent::SelectDate(date) => {
            let date = non_empty(date, "date")?;
            let Some(prefecture_id) = state.prefecture_id.clone() else {
                return Err(AppError::BadRequest(
                    "Select a prefecture before choosing a date".to_string(),
                ));
            };
            Ok((
                NavigationState {
                    date: Some(date.clone()),
                    ..state.clone()
                },
                Fetch::Forecast { prefecture_id, date },
            ))
        }
    }
}

fn non_empty(value: String, what: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("Empty {what} id")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_drill_down() {
        let start = NavigationState::default();

        let (state, fetch) =
            transition(&start, NavigationEvent::SelectRegion("010300".into())).unwrap();
        assert_eq!(fetch, Fetch::PrefectureList { region_id: "010300".into() });

        let (state, fetch) =
            transition(&state, NavigationEvent::SelectPrefecture("130000".into())).unwrap();
        assert_eq!(fetch, Fetch::DatesAndAreas { prefecture_id: "130000".into() });
        assert_eq!(state.region_id.as_deref(), Some("010300"));

        let (state, fetch) =
            transition(&state, NavigationEvent::SelectDate("2024-01-01".into())).unwrap();
        assert_eq!(
            fetch,
            Fetch::Forecast {
                prefecture_id: "130000".into(),
                date: "2024-01-01".into()
            }
        );
        assert_eq!(state.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn selecting_a_region_clears_lower_levels() {
        let state = NavigationState {
            region_id: Some("010300".into()),
            prefecture_id: Some("130000".into()),
            date: Some("2024-01-01".into()),
        };

        let (next, _) = transition(&state, NavigationEvent::SelectRegion("010600".into())).unwrap();

        assert_eq!(next.prefecture_id, None);
        assert_eq!(next.date, None);
    }

    #[test]
    fn date_requires_prefecture() {
        let err = transition(
            &NavigationState::default(),
            NavigationEvent::SelectDate("2024-01-01".into()),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn events_use_tagged_json() {
        let event: NavigationEvent =
            serde_json::from_str(r#"{"type": "select_prefecture", "value": "130000"}"#).unwrap();
        assert_eq!(event, NavigationEvent::SelectPrefecture("130000".into()));

        let err = transition(&NavigationState::default(), NavigationEvent::SelectRegion(" ".into()));
        assert!(err.is_err());
    }
}
