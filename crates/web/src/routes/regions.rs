//! Region picker data.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use rosewood_core::region::RegionCode;

use crate::error::{AppError, Result};
use crate::db::RegionRepository;
use crate::models::RegionName;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    /// Province or city code; omit for the list of provinces.
    pub parent: Option<String>,
}

/// Children of a region, for the cascading address selects.
///
/// `GET /regions` lists provinces, `?parent=<province>` its cities and
/// `?parent=<city>` its districts.
pub async fn children(
    State(state): State<AppState>,
    Query(query): Query<ChildrenQuery>,
) -> Result<Json<Vec<RegionName>>> {
    let parent = match query.parent.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(
            RegionCode::parse(code)
                .ok_or_else(|| AppError::BadRequest(format!("invalid region code: {code}")))?,
        ),
    };

    let children = RegionRepository::new(state.pool()).children(parent).await?;
    Ok(Json(children))
}
