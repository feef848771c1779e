use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Form, Json};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entities::{city, search_result};
use crate::error::{AppError, AppResult};
use crate::matcher::NearestMatch;
use crate::search;
use crate::usgs::Source;
use crate::AppState;

const DEFAULT_MIN_MAGNITUDE: f64 = 5.0;

#[derive(Template)]
#[template(path = "search.html")]
struct SearchPageTemplate;

#[derive(Template)]
#[template(path = "search_results.html")]
struct SearchResultsTemplate {
    result_message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_magnitude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_magnitude: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> AppResult<NaiveDate> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required parameter: {field}")))?;

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {field}: expected YYYY-MM-DD")))
}

/// Absent or unparsable magnitudes fall back to the default rather than fail
fn parse_min_magnitude(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_MIN_MAGNITUDE)
}

fn format_result_message(
    m: &NearestMatch,
    start_date: NaiveDate,
    end_date: NaiveDate,
    source: Source,
) -> String {
    format!(
        "Result between <strong>{}</strong> and <strong>{}</strong>:<br><br>\
         The closest impacted city was <strong>{}</strong> with a distance of \
         <strong>{:.2} km</strong> from the earthquake.<br>\
         The earthquake was a <strong>M {} - {}</strong> on {}.<br><br>\
         Source: {}.",
        start_date.format("%B %d, %Y"),
        end_date.format("%B %d, %Y"),
        m.city.name,
        m.distance_km,
        m.magnitude,
        m.location,
        m.date.format("%B %d, %Y"),
        source,
    )
}

/// Validate the form's dates, flattening errors into a displayable message
fn form_dates(form: &SearchForm) -> Result<(NaiveDate, NaiveDate), String> {
    let parse = |field, value: Option<&str>| {
        parse_date(field, value).map_err(|err| match err {
            AppError::BadRequest(message) => message,
            other => other.to_string(),
        })
    };

    Ok((
        parse("start_date", form.start_date.as_deref())?,
        parse("end_date", form.end_date.as_deref())?,
    ))
}

fn results_page(result_message: String) -> Html<String> {
    let template = SearchResultsTemplate { result_message };
    Html(template.render().unwrap_or_default())
}

/// Render the search form
pub async fn search_page() -> Html<String> {
    Html(SearchPageTemplate.render().unwrap_or_default())
}

/// Handle a form submission and render the outcome. Validation problems are
/// rendered on the results page, not returned as JSON error bodies.
pub async fn search_submit(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> AppResult<Html<String>> {
    let (start_date, end_date) = match form_dates(&form) {
        Ok(dates) => dates,
        Err(message) => return Ok(results_page(message)),
    };
    let min_magnitude = parse_min_magnitude(form.min_magnitude.as_deref());

    let outcome = search::run_search(&state.db, &state.gateway, start_date, end_date, min_magnitude)
        .await?;

    let result_message = match &outcome.nearest {
        Some(m) => format_result_message(m, start_date, end_date, outcome.source),
        None => "No results found.".to_string(),
    };

    Ok(results_page(result_message))
}

/// JSON search endpoint
pub async fn search_api(
    State(state): State<AppState>,
    Query(params): Query<ApiSearchParams>,
) -> AppResult<Json<serde_json::Value>> {
    let start_date = parse_date("start_date", params.start_date.as_deref())?;
    let end_date = parse_date("end_date", params.end_date.as_deref())?;
    let min_magnitude = parse_min_magnitude(params.min_magnitude.as_deref());

    let outcome = search::run_search(&state.db, &state.gateway, start_date, end_date, min_magnitude)
        .await?;

    match outcome.nearest {
        Some(m) => Ok(Json(json!({
            "nearest_city": m.city.name,
            "nearest_distance": m.distance_km,
            "magnitude": m.magnitude,
            "location": m.location,
            "date": m.date.format("%Y-%m-%d").to_string(),
            "source": outcome.source,
        }))),
        // A search that matches nothing is a normal outcome, not an error
        None => Ok(Json(json!({
            "message": "No earthquakes found for the given parameters."
        }))),
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResultInfo {
    pub id: i32,
    pub city: String,
    pub earthquake_magnitude: f64,
    pub earthquake_location: String,
    pub earthquake_date: NaiveDate,
    pub search_start_date: NaiveDate,
    pub search_end_date: NaiveDate,
    pub nearest_distance: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// List recorded search results, newest first
pub async fn list_results(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SearchResultInfo>>> {
    let results = search_result::Entity::find()
        .order_by_desc(search_result::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let cities = city::Entity::find().all(&state.db).await?;

    let responses: Vec<SearchResultInfo> = results
        .into_iter()
        .map(|r| {
            let city_name = cities
                .iter()
                .find(|c| c.id == r.city_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            SearchResultInfo {
                id: r.id,
                city: city_name,
                earthquake_magnitude: r.earthquake_magnitude,
                earthquake_location: r.earthquake_location,
                earthquake_date: r.earthquake_date,
                search_start_date: r.search_start_date,
                search_end_date: r.search_end_date,
                nearest_distance: r.nearest_distance,
                created_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_end_date_names_the_parameter() {
        let err = parse_date("end_date", None).unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert!(msg.contains("end_date")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_date_names_the_parameter() {
        let err = parse_date("start_date", Some("01/15/2024")).unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert!(msg.contains("start_date")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_date_parses() {
        let date = parse_date("start_date", Some("2024-01-15")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_form_date_errors_render_as_html() {
        let form = SearchForm {
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
            min_magnitude: None,
        };

        let message = form_dates(&form).unwrap_err();
        assert!(message.contains("end_date"));

        let Html(page) = results_page(message);
        assert!(page.contains("<html"));
        assert!(page.contains("Missing required parameter: end_date"));
    }

    #[test]
    fn test_min_magnitude_defaults() {
        assert_eq!(parse_min_magnitude(None), 5.0);
        assert_eq!(parse_min_magnitude(Some("not a number")), 5.0);
        assert_eq!(parse_min_magnitude(Some("6.5")), 6.5);
    }

    #[test]
    fn test_result_message_mentions_city_and_source() {
        let m = NearestMatch {
            city: city::Model {
                id: 3,
                name: "Tokyo, Japan".to_string(),
                latitude: Some(35.682839),
                longitude: Some(139.759455),
            },
            distance_km: 27.34,
            magnitude: 5.1,
            location: "11 km W of Ichihara, Japan".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 27).unwrap(),
        };

        let message = format_result_message(
            &m,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            Source::Live,
        );

        assert!(message.contains("Tokyo, Japan"));
        assert!(message.contains("27.34 km"));
        assert!(message.contains("January 27, 2024"));
        assert!(message.contains("live"));
    }
}
