use crate::config::{ServerConfig, SolverConfig};
use crate::data::{SeatingInput, SeatingOutput};
use crate::solver;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};

async fn solve_handler(
    State(config): State<SolverConfig>,
    Json(input): Json<SeatingInput>,
) -> Result<Json<SeatingOutput>, (StatusCode, String)> {
    let outcome = tokio::task::spawn_blocking(move || solver::solve(&input, &config))
        .await
        .map_err(|e| {
            error!("Solver task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match outcome {
        Ok(output) => Ok(Json(output)),
        Err(e) if e.is_input_error() => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            info!("Seating request failed: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(config: SolverConfig) -> Router {
    Router::new()
        .route("/v1/seating/solve", post(solve_handler))
        .route("/health", get(health_handler))
        .with_state(config)
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let app = router(config.solver);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn solve_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/seating/solve")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn student(id: &str, time: &str) -> Value {
        json!({
            "StudentID": id,
            "Year": 2,
            "Subject": "Maths",
            "Department": "CS",
            "Batch": "A",
            "ExamDate": "2024-05-01",
            "ExamTime": time
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = router(SolverConfig::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn solve_returns_layout() {
        let body = json!({
            "roster": [student("S1", "Morning"), student("S2", "Morning"), student("S3", "Evening")],
            "rooms": [{
                "room_name": "Room-A",
                "capacity": 4,
                "allowed_years": "2,3",
                "layout_columns": 2,
                "layout_rows": 2
            }]
        });
        let response = router(SolverConfig::default())
            .oneshot(solve_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let output: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(output["groupCount"], 2);
        assert_eq!(output["phase"], "firstFitDecreasing");
        assert_eq!(output["layout"]["Room-A"].as_array().unwrap().len(), 3);
        assert_eq!(output["records"][0]["Room"], "Room-A");
        assert_eq!(output["records"][0]["Seat_No"], 1);
    }

    #[tokio::test]
    async fn infeasible_is_unprocessable() {
        let body = json!({
            "roster": [student("S1", "Morning")],
            "rooms": [{ "room_id": "R", "capacity": 4, "allowed_years": [3] }]
        });
        let response = router(SolverConfig::default())
            .oneshot(solve_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn duplicate_student_is_bad_request() {
        let body = json!({
            "roster": [student("S1", "Morning"), student("S1", "Evening")],
            "rooms": [{ "room_id": "R", "capacity": 4, "allowed_years": [2] }]
        });
        let response = router(SolverConfig::default())
            .oneshot(solve_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
