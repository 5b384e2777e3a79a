use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::scheduling::earnings::{summarize, EarningsSummary};
use crate::store::{appointments, directory};
use crate::AppState;

#[derive(Deserialize)]
pub struct SummaryQuery {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    provider_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    #[serde(flatten)]
    summary: EarningsSummary,
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>> {
    if query.from > query.to {
        return Err(AppError::Validation("from must not be after to".into()));
    }
    directory::get_provider(&state.db, provider_id).await?;

    let rows = appointments::statuses_between(&state.db, provider_id, query.from, query.to).await?;

    Ok(Json(SummaryResponse {
        provider_id,
        from: query.from,
        to: query.to,
        summary: summarize(rows),
    }))
}
