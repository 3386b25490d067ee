//! Dashboard overview handlers

use axum::{extract::State, Json};

use crate::AppState;
use crate::models::{Kpis, NodeList};

pub async fn kpis(State(state): State<AppState>) -> Json<Kpis> {
    Json(state.store.kpis())
}

pub async fn nodes(State(state): State<AppState>) -> Json<NodeList> {
    Json(NodeList {
        items: state.store.nodes(),
    })
}
