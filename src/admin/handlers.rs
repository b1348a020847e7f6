use axum::{
    extract::State,
    Json,
};
use serde::Serialize;
use crate::policy::PolicySnapshot;
use super::AdminState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_policy(
    State(state): State<AdminState>,
) -> Json<PolicySnapshot> {
    Json(state.engine.snapshot())
}
