//! Region, cluster and branch management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use qrpulse_db::repositories::{
    CreateBranchInput, CreateClusterInput, CreateRegionInput, HierarchyRepository,
    UpdateBranchInput, UpdateClusterInput, UpdateRegionInput,
};
use qrpulse_shared::{
    AppError,
    types::{BranchId, ClusterId, RegionId},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, ApiError};

/// Creates the hierarchy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/regions", get(list_regions).post(create_region))
        .route("/regions/{region_id}", patch(update_region))
        .route("/clusters", get(list_clusters).post(create_cluster))
        .route("/clusters/{cluster_id}", patch(update_cluster))
        .route("/branches", get(list_branches).post(create_branch))
        .route(
            "/branches/{branch_id}",
            patch(update_branch).delete(deactivate_branch),
        )
}

/// Request body for creating a region.
#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    /// Region name.
    pub name: String,
    /// Region code.
    pub code: String,
}

/// Request body for updating a region.
#[derive(Debug, Deserialize)]
pub struct UpdateRegionRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

/// Query for listing regions.
#[derive(Debug, Deserialize)]
pub struct ListRegionsQuery {
    /// Include inactive regions.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for creating a cluster.
#[derive(Debug, Deserialize)]
pub struct CreateClusterRequest {
    pub region_id: RegionId,
    pub name: String,
    pub code: String,
}

/// Request body for updating a cluster.
#[derive(Debug, Deserialize)]
pub struct UpdateClusterRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

/// Query for listing clusters.
#[derive(Debug, Deserialize)]
pub struct ListClustersQuery {
    pub region_id: Option<RegionId>,
}

/// Request body for creating a branch.
#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub cluster_id: ClusterId,
    pub name: String,
    pub code: String,
    pub location: Option<String>,
}

/// Request body for updating a branch. A blank location clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateBranchRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

/// Query for listing branches.
#[derive(Debug, Deserialize)]
pub struct ListBranchesQuery {
    pub cluster_id: Option<ClusterId>,
}

/// Trims a required text field, rejecting blanks.
fn required(field: &str, value: String) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")).into());
    }
    Ok(trimmed.to_string())
}

/// GET `/regions` - List regions by name.
async fn list_regions(
    State(state): State<AppState>,
    Query(query): Query<ListRegionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let regions = HierarchyRepository::new((*state.db).clone())
        .list_regions(!query.include_inactive)
        .await?;
    Ok(Json(json!({ "regions": regions })))
}

/// POST `/regions` - Create a region.
async fn create_region(
    State(state): State<AppState>,
    Json(payload): Json<CreateRegionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateRegionInput {
        name: required("name", payload.name)?,
        code: required("code", payload.code)?.to_uppercase(),
    };
    let region = HierarchyRepository::new((*state.db).clone())
        .create_region(input)
        .await?;
    Ok((StatusCode::CREATED, Json(region)))
}

/// PATCH `/regions/{region_id}` - Rename, recode or (de)activate a region.
async fn update_region(
    State(state): State<AppState>,
    Path(region_id): Path<RegionId>,
    Json(payload): Json<UpdateRegionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateRegionInput {
        name: payload.name.map(|n| required("name", n)).transpose()?,
        code: payload
            .code
            .map(|c| required("code", c).map(|c| c.to_uppercase()))
            .transpose()?,
        is_active: payload.is_active,
    };
    let region = HierarchyRepository::new((*state.db).clone())
        .update_region(region_id, input)
        .await?;
    Ok(Json(region))
}

/// GET `/clusters` - List active clusters, optionally within one region.
async fn list_clusters(
    State(state): State<AppState>,
    Query(query): Query<ListClustersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let clusters = HierarchyRepository::new((*state.db).clone())
        .list_clusters(query.region_id)
        .await?;
    Ok(Json(json!({ "clusters": clusters })))
}

/// POST `/clusters` - Create a cluster in a region.
async fn create_cluster(
    State(state): State<AppState>,
    Json(payload): Json<CreateClusterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateClusterInput {
        region_id: payload.region_id,
        name: required("name", payload.name)?,
        code: required("code", payload.code)?.to_uppercase(),
    };
    let cluster = HierarchyRepository::new((*state.db).clone())
        .create_cluster(input)
        .await?;
    Ok((StatusCode::CREATED, Json(cluster)))
}

/// PATCH `/clusters/{cluster_id}` - Rename, recode or (de)activate a cluster.
async fn update_cluster(
    State(state): State<AppState>,
    Path(cluster_id): Path<ClusterId>,
    Json(payload): Json<UpdateClusterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateClusterInput {
        name: payload.name.map(|n| required("name", n)).transpose()?,
        code: payload
            .code
            .map(|c| required("code", c).map(|c| c.to_uppercase()))
            .transpose()?,
        is_active: payload.is_active,
    };
    let cluster = HierarchyRepository::new((*state.db).clone())
        .update_cluster(cluster_id, input)
        .await?;
    Ok(Json(cluster))
}

/// GET `/branches` - List active branches, optionally within one cluster.
async fn list_branches(
    State(state): State<AppState>,
    Query(query): Query<ListBranchesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let branches = HierarchyRepository::new((*state.db).clone())
        .list_branches(query.cluster_id)
        .await?;
    Ok(Json(json!({ "branches": branches })))
}

/// POST `/branches` - Create a branch in a cluster.
async fn create_branch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateBranchInput {
        cluster_id: payload.cluster_id,
        name: required("name", payload.name)?,
        code: required("code", payload.code)?.to_uppercase(),
        location: payload
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
    };
    let branch = HierarchyRepository::new((*state.db).clone())
        .create_branch(input)
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// PATCH `/branches/{branch_id}` - Edit a branch's details.
async fn update_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<BranchId>,
    Json(payload): Json<UpdateBranchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateBranchInput {
        name: payload.name.map(|n| required("name", n)).transpose()?,
        code: payload
            .code
            .map(|c| required("code", c).map(|c| c.to_uppercase()))
            .transpose()?,
        location: payload
            .location
            .map(|l| Some(l.trim().to_string()).filter(|l| !l.is_empty())),
        is_active: payload.is_active,
    };
    let branch = HierarchyRepository::new((*state.db).clone())
        .update_branch(branch_id, input)
        .await?;
    Ok(Json(branch))
}

/// DELETE `/branches/{branch_id}` - Deactivate a branch.
async fn deactivate_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<BranchId>,
) -> Result<impl IntoResponse, ApiError> {
    let branch = HierarchyRepository::new((*state.db).clone())
        .deactivate_branch(branch_id)
        .await?;
    tracing::info!(branch = %branch.code, "Deactivated branch");
    Ok(Json(branch))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{seed, send, test_state};

    #[tokio::test]
    async fn test_create_and_list_regions() {
        let state = test_state().await;

        let created = send(
            &state,
            "POST",
            "/api/v1/regions",
            Some(json!({ "name": "Krishna", "code": "kri" })),
            None,
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["code"], "KRI");
        assert_eq!(created.body["is_active"], true);

        let listed = send(&state, "GET", "/api/v1/regions", None, None).await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body["regions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_region_conflicts() {
        let state = test_state().await;
        let body = json!({ "name": "Guntur", "code": "GNT" });

        send(&state, "POST", "/api/v1/regions", Some(body.clone()), None).await;
        let again = send(&state, "POST", "/api/v1/regions", Some(body), None).await;

        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.body["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let state = test_state().await;

        let response = send(
            &state,
            "POST",
            "/api/v1/regions",
            Some(json!({ "name": "  ", "code": "X" })),
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_deactivated_region_hidden_by_default() {
        let state = test_state().await;
        let seeded = seed(&state, "B001").await;

        let updated = send(
            &state,
            "PATCH",
            &format!("/api/v1/regions/{}", seeded.region_id),
            Some(json!({ "is_active": false })),
            None,
        )
        .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["is_active"], false);

        let active = send(&state, "GET", "/api/v1/regions", None, None).await;
        assert!(active.body["regions"].as_array().unwrap().is_empty());

        let all = send(&state, "GET", "/api/v1/regions?include_inactive=true", None, None).await;
        assert_eq!(all.body["regions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cluster_requires_existing_region() {
        let state = test_state().await;

        let response = send(
            &state,
            "POST",
            "/api/v1/clusters",
            Some(json!({ "region_id": uuid::Uuid::new_v4(), "name": "Orphan", "code": "O1" })),
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filtered_by_parent() {
        let state = test_state().await;
        let seeded = seed(&state, "B001").await;

        let clusters = send(
            &state,
            "GET",
            &format!("/api/v1/clusters?region_id={}", seeded.region_id),
            None,
            None,
        )
        .await;
        assert_eq!(clusters.body["clusters"].as_array().unwrap().len(), 1);

        let branches = send(
            &state,
            "GET",
            &format!("/api/v1/branches?cluster_id={}", seeded.cluster_id),
            None,
            None,
        )
        .await;
        let branches = branches.body["branches"].as_array().unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0]["code"], "B001");
    }

    #[tokio::test]
    async fn test_update_cluster_and_branch() {
        let state = test_state().await;
        let seeded = seed(&state, "B001").await;

        let cluster = send(
            &state,
            "PATCH",
            &format!("/api/v1/clusters/{}", seeded.cluster_id),
            Some(json!({ "name": "East", "code": "e1" })),
            None,
        )
        .await;
        assert_eq!(cluster.status, StatusCode::OK, "{}", cluster.body);
        assert_eq!(cluster.body["name"], "East");
        assert_eq!(cluster.body["code"], "E1");

        let branch = send(
            &state,
            "PATCH",
            &format!("/api/v1/branches/{}", seeded.branch_id),
            Some(json!({ "name": "Benz Circle", "location": "MG Road" })),
            None,
        )
        .await;
        assert_eq!(branch.status, StatusCode::OK, "{}", branch.body);
        assert_eq!(branch.body["name"], "Benz Circle");
        assert_eq!(branch.body["location"], "MG Road");
        assert_eq!(branch.body["code"], "B001");

        let cleared = send(
            &state,
            "PATCH",
            &format!("/api/v1/branches/{}", seeded.branch_id),
            Some(json!({ "location": " " })),
            None,
        )
        .await;
        assert!(cleared.body["location"].is_null());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_or_missing() {
        let state = test_state().await;
        let seeded = seed(&state, "B001").await;

        let blank = send(
            &state,
            "PATCH",
            &format!("/api/v1/branches/{}", seeded.branch_id),
            Some(json!({ "name": "" })),
            None,
        )
        .await;
        assert_eq!(blank.status, StatusCode::BAD_REQUEST);

        let missing = send(
            &state,
            "PATCH",
            &format!("/api/v1/clusters/{}", uuid::Uuid::new_v4()),
            Some(json!({ "name": "Ghost" })),
            None,
        )
        .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deactivate_branch() {
        let state = test_state().await;
        let seeded = seed(&state, "B001").await;

        let response = send(
            &state,
            "DELETE",
            &format!("/api/v1/branches/{}", seeded.branch_id),
            None,
            None,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["is_active"], false);

        let branches = send(&state, "GET", "/api/v1/branches", None, None).await;
        assert!(branches.body["branches"].as_array().unwrap().is_empty());

        let missing = send(
            &state,
            "DELETE",
            &format!("/api/v1/branches/{}", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }
}
