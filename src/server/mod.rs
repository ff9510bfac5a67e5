// SPDX-License-Identifier: MIT

//! HTTP surface for branch evaluation
//!
//! Every request carries its own task results, so concurrent callers never
//! share lookup state.

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::branching::{self, expression_from_value, TaskResults};
use crate::error::{BranchingError, EvalError};

/// Port used when neither `--port` nor `BRANCHING_PORT` is given
pub const DEFAULT_PORT: u16 = 3000;

/// Read the listen port from `BRANCHING_PORT`
pub fn port_from_env() -> Result<u16, BranchingError> {
    parse_port(std::env::var("BRANCHING_PORT").ok())
}

fn parse_port(raw: Option<String>) -> Result<u16, BranchingError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BranchingError::Config(format!("Invalid BRANCHING_PORT: {}", raw))),
        None => Ok(DEFAULT_PORT),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/evaluate", post(evaluate))
        .route("/api/compile", post(compile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(port: u16) -> Result<(), BranchingError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct EvaluateRequest {
    #[serde(default)]
    results: TaskResults,
    branch: Value,
}

#[derive(Deserialize)]
struct CompileRequest {
    branch: Value,
}

async fn evaluate(Json(payload): Json<EvaluateRequest>) -> (StatusCode, Json<Value>) {
    let outcome = expression_from_value(&payload.branch)
        .and_then(|expr| branching::evaluate_branch(&payload.results, &expr));

    match outcome {
        Ok(value) => {
            log::debug!("Branch evaluated to {}", value);
            (StatusCode::OK, Json(json!({ "value": value })))
        }
        Err(e) => {
            log::warn!("Branch evaluation failed: {}", e);
            error_response(&e)
        }
    }
}

async fn compile(Json(payload): Json<CompileRequest>) -> (StatusCode, Json<Value>) {
    match expression_from_value(&payload.branch) {
        Ok(expr) => {
            let postfix: Vec<String> = branching::compile(&expr)
                .iter()
                .map(|t| t.to_string())
                .collect();
            (StatusCode::OK, Json(json!({ "postfix": postfix })))
        }
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &EvalError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}
