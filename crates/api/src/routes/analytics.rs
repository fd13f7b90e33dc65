//! Analytics routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use qrpulse_core::analytics::{AnalyticsService, DateWindow};
use qrpulse_db::repositories::{AnalyticsRepository, HierarchyRepository, SocialScope};
use qrpulse_shared::types::{BranchId, ClusterId, RegionId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, ApiError};

/// Creates the analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/regions", get(region_analytics))
        .route("/analytics/branches", get(branch_performance))
        .route("/analytics/social", get(social_analytics))
}

/// Query for the region report.
#[derive(Debug, Deserialize)]
pub struct RegionAnalyticsQuery {
    /// Restrict to one region.
    pub region_id: Option<RegionId>,
    /// First day included.
    pub start_date: Option<NaiveDate>,
    /// Last day included.
    pub end_date: Option<NaiveDate>,
    /// Include cluster and branch breakdowns.
    #[serde(default)]
    pub include_details: bool,
}

/// Query for the branch ranking.
#[derive(Debug, Deserialize)]
pub struct BranchPerformanceQuery {
    pub region_id: Option<RegionId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Query for the social report. The narrowest filter given wins.
#[derive(Debug, Deserialize)]
pub struct SocialAnalyticsQuery {
    pub region_id: Option<RegionId>,
    pub cluster_id: Option<ClusterId>,
    pub branch_id: Option<BranchId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// GET `/analytics/regions` - Scans, clicks and new vs returning per region.
async fn region_analytics(
    State(state): State<AppState>,
    Query(query): Query<RegionAnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = DateWindow::new(query.start_date, query.end_date)?;

    let hierarchy = HierarchyRepository::new((*state.db).clone())
        .load_active_hierarchy(query.region_id)
        .await?;
    let counts = AnalyticsRepository::new((*state.db).clone())
        .branch_activity(&window)
        .await?;

    let mut regions = AnalyticsService::rollup(&hierarchy, &counts);
    if !query.include_details {
        regions = AnalyticsService::without_details(regions);
    }

    Ok(Json(json!({
        "start_date": query.start_date,
        "end_date": query.end_date,
        "regions": regions,
    })))
}

/// GET `/analytics/branches` - Active branches ranked by scans plus clicks.
async fn branch_performance(
    State(state): State<AppState>,
    Query(query): Query<BranchPerformanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = DateWindow::new(query.start_date, query.end_date)?;

    let hierarchy = HierarchyRepository::new((*state.db).clone())
        .load_active_hierarchy(query.region_id)
        .await?;
    let counts = AnalyticsRepository::new((*state.db).clone())
        .branch_activity(&window)
        .await?;

    let branches =
        AnalyticsService::branch_performance(AnalyticsService::rollup(&hierarchy, &counts));
    Ok(Json(json!({ "branches": branches })))
}

/// GET `/analytics/social` - Social clicks per platform.
async fn social_analytics(
    State(state): State<AppState>,
    Query(query): Query<SocialAnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = DateWindow::new(query.start_date, query.end_date)?;
    let scope = SocialScope::narrowest(query.region_id, query.cluster_id, query.branch_id);

    let counts = AnalyticsRepository::new((*state.db).clone())
        .social_counts(scope, &window)
        .await?;

    Ok(Json(AnalyticsService::social_report(
        counts.platforms,
        counts.new_users,
        counts.returning_users,
    )))
}
