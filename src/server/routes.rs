use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::data::tables::EventTables;
use crate::server::api::{self, ApiError};

pub struct AppState {
    pub tables: EventTables,
    pub static_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

pub fn create_router(state: SharedState) -> Router {
    let static_files =
        ServeDir::new(&state.static_dir).not_found_service(not_found.into_service());
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/tables", get(tables))
        .route("/api/calculate", post(calculate))
        .route("/api/starlight/calculate", post(starlight_calculate))
        .route("/api/starlight/simulate", post(starlight_simulate))
        .fallback_service(static_files)
        .with_state(state)
}

async fn index(State(state): State<SharedState>) -> Response {
    let custom = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&custom).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => Html(INDEX_HTML).into_response(),
    }
}

async fn health() -> Response {
    match api::health_payload() {
        Ok(payload) => json_response(StatusCode::OK, payload),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

async fn tables(State(state): State<SharedState>) -> Response {
    match api::tables_payload(&state.tables) {
        Ok(payload) => json_response(StatusCode::OK, payload),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

async fn calculate(State(state): State<SharedState>, body: String) -> Response {
    api_response(api::calculate_payload(&state.tables, &body))
}

async fn starlight_calculate(State(state): State<SharedState>, body: String) -> Response {
    api_response(api::starlight_calculate_payload(&state.tables, &body))
}

async fn starlight_simulate(State(state): State<SharedState>, body: String) -> Response {
    let outcome = tokio::task::spawn_blocking(move || {
        api::starlight_simulate_payload(&state.tables, &body)
    })
    .await;
    match outcome {
        Ok(result) => api_response(result),
        Err(err) => {
            log::error!("simulation task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}

fn api_response(result: Result<String, ApiError>) -> Response {
    match result {
        Ok(payload) => json_response(StatusCode::OK, payload),
        Err(ApiError::Validation(validation)) => {
            match serde_json::to_string_pretty(&validation) {
                Ok(payload) => json_response(StatusCode::BAD_REQUEST, payload),
                Err(_) => error_response(StatusCode::BAD_REQUEST, validation.message),
            }
        }
        Err(err @ ApiError::Parse(_)) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        Err(err @ ApiError::Serialize(_)) => {
            log::error!("{err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "status": "error", "message": message });
    let payload = serde_json::to_string_pretty(&body)
        .unwrap_or_else(|_| "{\"status\":\"error\"}".to_string());
    json_response(status, payload)
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Gacha EV Calculator</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    h1 { margin-bottom: 8px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input, select { width: 100%; padding: 8px; box-sizing: border-box; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Gacha EV Calculator</h1>
  <p>Expected value of an investment in the breath and starlight events.</p>

  <div class="card">
    <strong>Purchase</strong>
    <label for="investment">Investment</label>
    <input id="investment" type="number" min="0" value="10000" />
    <label for="method">Method</label>
    <select id="method">
      <option value="original">original</option>
      <option value="card">card</option>
      <option value="cardreader">cardreader</option>
      <option value="gift">gift</option>
    </select>
    <label for="discount">Discount</label>
    <input id="discount" type="number" min="0" step="0.01" value="0" />
  </div>

  <div class="card">
    <strong>Breath event</strong>
    <label for="boxes">Box values (JSON)</label>
    <input id="boxes" value='{"small": 0, "medium": 0, "large": 0, "super": 0}' />
    <div><button id="calculate-btn">POST /api/calculate</button></div>
  </div>

  <div class="card">
    <strong>Starlight event</strong>
    <label for="count">Simulation count</label>
    <input id="count" type="number" min="1" max="1000000" value="10000" />
    <div>
      <button id="starlight-btn">POST /api/starlight/calculate</button>
      <button id="draws-btn">Simulate draws</button>
      <button id="ladder-btn">Simulate ladder</button>
    </div>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const value = id => document.getElementById(id).value;

    function purchase() {
      return {
        investment: Number(value('investment')) || 0,
        method: value('method'),
        discount: Number(value('discount')) || 0,
      };
    }

    async function post(path, payload) {
      output.textContent = 'Loading…';
      const response = await fetch(path, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload),
      });
      output.textContent = 'HTTP ' + response.status + '\n' + await response.text();
    }

    document.getElementById('calculate-btn').addEventListener('click', () => {
      let boxes = {};
      try { boxes = JSON.parse(value('boxes')); } catch (e) {}
      post('/api/calculate', Object.assign(purchase(), { box_values: boxes }));
    });
    document.getElementById('starlight-btn').addEventListener('click', () => {
      post('/api/starlight/calculate', Object.assign(purchase(), { prices: {} }));
    });
    document.getElementById('draws-btn').addEventListener('click', () => {
      post('/api/starlight/simulate', { mode: 'draws', count: Number(value('count')) || 1 });
    });
    document.getElementById('ladder-btn').addEventListener('click', () => {
      post('/api/starlight/simulate', { mode: 'ladder', count: Number(value('count')) || 1 });
    });
  </script>
</body>
</html>
"#;
