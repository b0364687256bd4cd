use crate::ai;
use crate::analyzer::history::{self, CalendarEvent, HistoryStats};
use crate::analyzer::metrics::MoodScore;
use crate::analyzer::persona::CoachPersona;
use crate::session::store::DayRecord;
use crate::session::{self, CheckInInput, CheckInOutcome, CompletedHabits, PreparedCheckIn, Session};
use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Mutex<Session>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/personas", get(personas))
        .route("/api/v1/context", get(context))
        .route("/api/v1/records", get(records))
        .route("/api/v1/calendar", get(calendar))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/checkin", post(check_in))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ContextQuery {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckInPayload {
    date: Option<String>,
    city: Option<String>,
    persona: Option<String>,
    mood: i64,
    #[serde(default)]
    done: Vec<usize>,
    #[serde(default)]
    habits: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    days_tracked: usize,
    city: String,
    coach_persona: &'static str,
    ai_key_configured: bool,
    weather_key_configured: bool,
    habits: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PersonaView {
    key: &'static str,
    name: &'static str,
    instruction: &'static str,
}

#[derive(Debug, Serialize)]
struct RecordsPayload {
    count: usize,
    records: Vec<DayRecord>,
}

#[derive(Debug, Serialize)]
struct CalendarPayload {
    events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
struct CheckInPayloadView {
    outcome: CheckInOutcome,
    message: String,
    days_tracked: usize,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let session = state.session.lock().await;
    let config = session.config();

    Ok(Json(StatusPayload {
        days_tracked: session.store().len(),
        city: config.city.clone(),
        coach_persona: config.coach_persona.key(),
        ai_key_configured: ai::has_api_key(config),
        weather_key_configured: config.resolve_weather_api_key().is_some(),
        habits: config.habits.clone(),
    }))
}

async fn personas() -> Json<Vec<PersonaView>> {
    Json(
        CoachPersona::ALL
            .iter()
            .map(|persona| PersonaView {
                key: persona.key(),
                name: persona.display_name(),
                instruction: persona.instruction(),
            })
            .collect(),
    )
}

async fn context(
    State(state): State<ApiState>,
    Query(query): Query<ContextQuery>,
) -> ApiResult<Json<PreparedCheckIn>> {
    let config = state.session.lock().await.config().clone();
    let city = query
        .city
        .map(|city| city.trim().to_string())
        .filter(|city| !city.is_empty())
        .unwrap_or_else(|| config.city.clone());

    let prepared = tokio::task::spawn_blocking(move || session::prepare(&config, &city))
        .await
        .context("Context lookup task failed")?;

    Ok(Json(prepared))
}

async fn records(State(state): State<ApiState>) -> ApiResult<Json<RecordsPayload>> {
    let session = state.session.lock().await;
    let records = session.store().all().to_vec();

    Ok(Json(RecordsPayload {
        count: records.len(),
        records,
    }))
}

async fn calendar(State(state): State<ApiState>) -> ApiResult<Json<CalendarPayload>> {
    let session = state.session.lock().await;

    Ok(Json(CalendarPayload {
        events: history::calendar_events(session.store().all()),
    }))
}

async fn stats(State(state): State<ApiState>) -> ApiResult<Json<HistoryStats>> {
    let session = state.session.lock().await;
    Ok(Json(history::stats(session.store().all())))
}

async fn check_in(
    State(state): State<ApiState>,
    payload: Result<Json<CheckInPayload>, JsonRejection>,
) -> ApiResult<Json<CheckInPayloadView>> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid check-in body: {}", rejection.body_text()))
    })?;
    let mood = u8::try_from(payload.mood)
        .map_err(anyhow::Error::from)
        .and_then(MoodScore::new)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let date = payload
        .date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(session::today);
    if !payload.done.is_empty() && !payload.habits.is_empty() {
        return Err(ApiError::BadRequest(
            "Use either `done` (1-based indices) or `habits` (names), not both".to_string(),
        ));
    }
    let completed = if payload.habits.is_empty() {
        let indices = payload
            .done
            .iter()
            .map(|index| {
                index
                    .checked_sub(1)
                    .ok_or_else(|| ApiError::BadRequest("habit indices start at 1".to_string()))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        CompletedHabits::Indices(indices)
    } else {
        CompletedHabits::Names(payload.habits)
    };

    let config = state.session.lock().await.config().clone();
    let input = CheckInInput {
        date,
        completed,
        mood,
        persona: payload
            .persona
            .as_deref()
            .map(CoachPersona::parse)
            .unwrap_or(config.coach_persona),
    };
    let city = payload
        .city
        .map(|city| city.trim().to_string())
        .filter(|city| !city.is_empty())
        .unwrap_or_else(|| config.city.clone());

    let outcome = tokio::task::spawn_blocking(move || {
        let prepared = session::prepare(&config, &city);
        session::evaluate(&config, prepared, input)
    })
    .await
    .context("Check-in task failed")?
    .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let mut session = state.session.lock().await;
    session.record(&outcome);

    Ok(Json(CheckInPayloadView {
        message: outcome.report.message(),
        days_tracked: session.store().len(),
        outcome,
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date format: {input}. Example: 2026-10-17"))
    })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => {
                tracing::error!(error = %error, "API request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SecretSource};
    use crate::session::store::HabitRecordStore;
    use crate::test_support::closed_port_url;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::Value;
    use tower::ServiceExt;

    fn offline_config() -> Config {
        Config {
            weather_api_key: None,
            weather_api_base_url: closed_port_url(),
            companion_api_url: closed_port_url(),
            ai_api_base_url: closed_port_url(),
            lookup_timeout_seconds: 1,
            secret_source: SecretSource::ConfigFileOnly,
            ..Config::default()
        }
    }

    fn app(store: HabitRecordStore) -> (Router, ApiState) {
        let state = ApiState {
            session: Arc::new(Mutex::new(Session::with_store(offline_config(), store))),
        };
        (router(state.clone()), state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn records_and_calendar_reflect_seeded_store() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).expect("date");
        let store = HabitRecordStore::seeded(&mut StdRng::seed_from_u64(3), today, 7, 5);
        let (router, _) = app(store);

        let response = router
            .clone()
            .oneshot(Request::get("/api/v1/records").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 7);
        assert_eq!(body["records"][6]["date"], "2026-10-16");

        let response = router
            .oneshot(Request::get("/api/v1/calendar").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["events"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn out_of_range_mood_is_rejected() {
        let (router, state) = app(HabitRecordStore::new());

        let response = router
            .oneshot(post_json("/api/v1/checkin", json!({ "mood": 11, "done": [1] })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.session.lock().await.store().is_empty());
    }

    #[tokio::test]
    async fn check_in_is_recorded_even_when_report_is_blocked() {
        let (router, state) = app(HabitRecordStore::new());

        let response = router
            .oneshot(post_json(
                "/api/v1/checkin",
                json!({ "mood": 7, "done": [1, 3, 5], "date": "2026-10-17", "persona": "mentor" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["outcome"]["record"]["achievement_rate"], 60.0);
        assert_eq!(body["outcome"]["request"]["persona"], "warm_mentor");
        assert_eq!(body["outcome"]["request"]["context"]["weather"]["status"], "absent");
        assert_eq!(body["outcome"]["report"]["status"], "missing_credential");
        assert_eq!(body["days_tracked"], 1);
        assert_eq!(state.session.lock().await.store().len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_bad_request() {
        let (router, state) = app(HabitRecordStore::new());

        let response = router
            .clone()
            .oneshot(post_json("/api/v1/checkin", json!({ "done": [1] })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|message| message.contains("mood"))
        );

        let response = router
            .oneshot(
                Request::post("/api/v1/checkin")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert!(state.session.lock().await.store().is_empty());
    }

    #[tokio::test]
    async fn zero_index_and_unknown_route_are_errors() {
        let (router, _) = app(HabitRecordStore::new());

        let response = router
            .clone()
            .oneshot(post_json("/api/v1/checkin", json!({ "mood": 5, "done": [0] })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn personas_lists_every_style() {
        let (router, _) = app(HabitRecordStore::new());

        let response = router
            .oneshot(Request::get("/api/v1/personas").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(
            body.as_array().map(Vec::len),
            Some(CoachPersona::ALL.len())
        );
    }
}
