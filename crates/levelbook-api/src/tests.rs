//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use levelbook_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn new_survey(app: &Router) -> String {
  let (status, survey) = send(
    app,
    "POST",
    "/surveys",
    Some(json!({ "name": "NH-44 widening", "datum_rl": 100.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  survey["survey_id"].as_str().unwrap().to_owned()
}

async fn new_purpose(app: &Router, survey_id: &str, kind: &str) -> String {
  let (status, purpose) = send(
    app,
    "POST",
    &format!("/surveys/{survey_id}/purposes"),
    Some(json!({ "kind": kind })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  purpose["purpose_id"].as_str().unwrap().to_owned()
}

async fn book(app: &Router, purpose_id: &str, reading: Value) -> Value {
  let (status, row) = send(
    app,
    "POST",
    &format!("/purposes/{purpose_id}/rows"),
    Some(json!({ "reading": reading })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{row}");
  row
}

// ─── Surveys ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn survey_defaults_chainage_multiple() {
  let app = app().await;
  let id = new_survey(&app).await;

  let (status, survey) = send(&app, "GET", &format!("/surveys/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(survey["chainage_multiple"], 20);

  let (_, all) = send(&app, "GET", "/surveys", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn survey_with_empty_name_is_unprocessable() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/surveys",
    Some(json!({ "name": " ", "datum_rl": 100.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn missing_survey_is_404() {
  let app = app().await;
  let uri = format!("/surveys/{}", uuid::Uuid::new_v4());
  let (status, _) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn finished_survey_refuses_purposes_with_409() {
  let app = app().await;
  let id = new_survey(&app).await;
  let (status, _) = send(&app, "POST", &format!("/surveys/{id}/finish"), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(
    &app,
    "POST",
    &format!("/surveys/{id}/purposes"),
    Some(json!({ "kind": "Initial Level" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Booking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rows_are_reduced_on_commit() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;

  let row = book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;
  assert_eq!(row["seq"], 1);
  assert_eq!(row["reduction"]["height_of_instrument"], 101.5);

  let row = book(
    &app,
    &purpose,
    json!({
      "type": "chainage",
      "chainage": "0/000",
      "offsets": [0],
      "intermediate_sight": ["1.000"]
    }),
  )
  .await;
  assert_eq!(row["reduction"]["reduced_levels"], json!([100.5]));

  let row = book(&app, &purpose, json!({ "type": "cp", "fore_sight": 1.2, "back_sight": 1.8 })).await;
  assert_eq!(row["seq"], 3);
  assert_eq!(row["reduction"]["reduced_levels"], json!([100.3]));
  assert_eq!(row["reduction"]["height_of_instrument"], 102.1);
}

#[tokio::test]
async fn first_row_must_be_a_setup() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/rows"),
    Some(json!({ "reading": { "type": "tbm", "intermediate_sight": 1.2 } })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn duplicate_chainage_is_unprocessable() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;
  let station = json!({
    "type": "chainage",
    "chainage": "0/000",
    "offsets": [0, 5],
    "intermediate_sight": [1.0, 1.1]
  });

  book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;
  book(&app, &purpose, station.clone()).await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/rows"),
    Some(json!({ "reading": station })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn preview_reduces_without_committing() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;
  book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;

  let (status, preview) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/preview"),
    Some(json!({ "reading": { "type": "tbm", "intermediate_sight": 0.5 } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(preview["reduction"]["reduced_levels"], json!([101.0]));
  assert_eq!(preview["warning"], Value::Null);

  let (_, stored) = send(&app, "GET", &format!("/purposes/{purpose}"), None).await;
  assert_eq!(stored["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn preview_flags_a_second_setup() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;
  book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;

  let (status, preview) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/preview"),
    Some(json!({ "reading": { "type": "instrument_setup", "back_sight": 1.4 } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(preview["warning"].as_str().unwrap().contains("instrument setup"));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn pause_and_resume_replace_the_provisional_row() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;
  book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;
  book(&app, &purpose, json!({ "type": "tbm", "intermediate_sight": 9.9 })).await;

  let (status, paused) = send(&app, "POST", &format!("/purposes/{purpose}/pause"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(paused["status"], "Paused");

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/rows"),
    Some(json!({ "reading": { "type": "tbm", "intermediate_sight": 0.5 } })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, row) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/resume"),
    Some(json!({ "reading": { "type": "tbm", "intermediate_sight": 0.5 } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(row["seq"], 2);
  assert_eq!(row["reduction"]["reduced_levels"], json!([101.0]));

  let (_, stored) = send(&app, "GET", &format!("/purposes/{purpose}"), None).await;
  assert_eq!(stored["status"], "Active");
  assert_eq!(stored["rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn resume_of_active_purpose_is_409() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/resume"),
    Some(json!({ "reading": { "type": "instrument_setup", "back_sight": 1.5 } })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn finished_pass_reports_its_closure() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let purpose = new_purpose(&app, &survey, "Initial Level").await;
  book(&app, &purpose, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;
  book(&app, &purpose, json!({ "type": "cp", "fore_sight": 1.2, "back_sight": 1.8 })).await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/finish"),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  // HI 102.1 − 2.1 lands back on the datum.
  let (status, finished) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/finish"),
    Some(json!({ "final_fore_sight": 2.1 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(finished["status"], "Finished");

  let (status, book_json) = send(&app, "GET", &format!("/purposes/{purpose}/fieldbook"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(book_json["closure"]["status"], "closed");
  assert_eq!(book_json["closure"]["remarks"], "Closed on Starting TBM at ±0.000");

  let (status, _) = send(
    &app,
    "POST",
    &format!("/purposes/{purpose}/rows"),
    Some(json!({ "reading": { "type": "tbm", "intermediate_sight": 1.0 } })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Stations and quantities ─────────────────────────────────────────────────

#[tokio::test]
async fn next_chainage_follows_the_initial_pass() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let initial = new_purpose(&app, &survey, "Initial Level").await;
  let proposed = new_purpose(&app, &survey, "Proposed Level").await;

  let (_, next) = send(&app, "GET", &format!("/purposes/{initial}/next-chainage"), None).await;
  assert_eq!(next["chainage"], "0/000");

  book(&app, &initial, json!({ "type": "instrument_setup", "back_sight": 1.5 })).await;
  book(
    &app,
    &initial,
    json!({
      "type": "chainage",
      "chainage": "0/000",
      "offsets": [-3.5, 0, 3.5],
      "intermediate_sight": [1.2, 1.1, 1.2]
    }),
  )
  .await;

  let (_, next) = send(&app, "GET", &format!("/purposes/{initial}/next-chainage"), None).await;
  assert_eq!(next["chainage"], "0/020");
  assert_eq!(next["offsets"], json!([-3.5, 0.0, 3.5]));

  let (_, next) = send(&app, "GET", &format!("/purposes/{proposed}/next-chainage"), None).await;
  assert_eq!(next["chainage"], "0/000");

  book(
    &app,
    &proposed,
    json!({
      "type": "chainage",
      "chainage": "0/000",
      "offsets": [-3.5, 0, 3.5],
      "reduced_level": [100.0, 100.1, 100.0]
    }),
  )
  .await;
  let (_, next) = send(&app, "GET", &format!("/purposes/{proposed}/next-chainage"), None).await;
  assert_eq!(next, Value::Null);
}

#[tokio::test]
async fn earthwork_between_initial_and_proposed() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let initial = new_purpose(&app, &survey, "Initial Level").await;
  let proposed = new_purpose(&app, &survey, "Proposed Level").await;

  // Datum 100, HI 101; ground levels are 101 − IS.
  book(&app, &initial, json!({ "type": "instrument_setup", "back_sight": 1.0 })).await;
  for (label, sights) in [("0/000", [1.0, 2.0]), ("0/010", [1.0, 1.0])] {
    book(
      &app,
      &initial,
      json!({
        "type": "chainage",
        "chainage": label,
        "offsets": [0, 5],
        "intermediate_sight": sights
      }),
    )
    .await;
  }
  for (label, levels) in [("0/000", [99.5, 99.5]), ("0/010", [99.0, 99.0])] {
    book(
      &app,
      &proposed,
      json!({
        "type": "chainage",
        "chainage": label,
        "offsets": [0, 5],
        "reduced_level": levels
      }),
    )
    .await;
  }

  let (status, section) = send(
    &app,
    "GET",
    &format!("/surveys/{survey}/cross-section?chainage=0/010&purposes={initial},{proposed}"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(section["series"].as_array().unwrap().len(), 2);
  assert_eq!(section["offsets"], json!([0.0, 5.0]));

  let (status, report) = send(&app, "GET", &format!("/surveys/{survey}/earthwork"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["sections"].as_array().unwrap().len(), 2);
  // 0/000: ground 99 below design 99.5 → fill (99+99.5)/2×5
  assert_eq!(report["sections"][0]["area"]["total_filling"], 496.25);
  // 0/010: ground 100 above design 99 → cut (100+99)/2×5
  assert_eq!(report["sections"][1]["area"]["total_cutting"], 497.5);
  assert_eq!(report["volume"]["total_cutting_volume"], 2487.5);
  assert_eq!(report["volume"]["total_filling_volume"], 2481.25);
}

#[tokio::test]
async fn earthwork_without_a_proposal_is_404() {
  let app = app().await;
  let survey = new_survey(&app).await;
  new_purpose(&app, &survey, "Initial Level").await;

  let (status, _) = send(&app, "GET", &format!("/surveys/{survey}/earthwork"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cross_section_rejects_malformed_purpose_ids() {
  let app = app().await;
  let survey = new_survey(&app).await;

  let (status, _) = send(
    &app,
    "GET",
    &format!("/surveys/{survey}/cross-section?chainage=0/000&purposes=nope"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proposal_offsets_must_match_the_initial_pass() {
  let app = app().await;
  let survey = new_survey(&app).await;
  let initial = new_purpose(&app, &survey, "Initial Level").await;
  let proposed = new_purpose(&app, &survey, "Proposed Level").await;

  book(&app, &initial, json!({ "type": "instrument_setup", "back_sight": 1.0 })).await;
  book(
    &app,
    &initial,
    json!({
      "type": "chainage",
      "chainage": "0/000",
      "offsets": [-5, 0, 5],
      "intermediate_sight": [1.0, 1.0, 1.0]
    }),
  )
  .await;

  let shifted = json!({
    "type": "chainage",
    "chainage": "0/000",
    "offsets": [0, 5, 10],
    "reduced_level": [99.0, 99.0, 102.0]
  });
  let (status, preview) = send(
    &app,
    "POST",
    &format!("/purposes/{proposed}/preview"),
    Some(json!({ "reading": shifted })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(preview["warning"].as_str().unwrap().contains("0/000"));

  let (status, body) = send(
    &app,
    "POST",
    &format!("/purposes/{proposed}/rows"),
    Some(json!({ "reading": shifted })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

  book(
    &app,
    &proposed,
    json!({
      "type": "chainage",
      "chainage": "0/000",
      "offsets": [-5, 0, 5],
      "reduced_level": [99.0, 99.0, 99.0]
    }),
  )
  .await;
}
