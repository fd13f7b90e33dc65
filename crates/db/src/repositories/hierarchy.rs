//! Hierarchy repository for regions, clusters and branches.

use qrpulse_core::analytics::{BranchNode, ClusterNode, Hierarchy, RegionNode};
use qrpulse_shared::types::{BranchId, ClusterId, RegionId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::entities::{branches, clusters, regions};

/// Error types for hierarchy operations.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Region not found.
    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    /// Cluster not found.
    #[error("Cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    /// Branch not found.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// A unique name or code is already taken.
    #[error("{0} already exists")]
    Duplicate(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl HierarchyError {
    /// Maps a unique-constraint violation on insert/update to `Duplicate`.
    fn from_write(err: DbErr, what: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Duplicate(what()),
            _ => Self::Database(err),
        }
    }
}

/// Input for creating a region.
#[derive(Debug, Clone)]
pub struct CreateRegionInput {
    /// Region name (unique).
    pub name: String,
    /// Region code (unique).
    pub code: String,
}

/// Input for updating a region.
#[derive(Debug, Clone, Default)]
pub struct UpdateRegionInput {
    /// Region name.
    pub name: Option<String>,
    /// Region code.
    pub code: Option<String>,
    /// Whether the region is active.
    pub is_active: Option<bool>,
}

/// Input for creating a cluster.
#[derive(Debug, Clone)]
pub struct CreateClusterInput {
    /// Parent region.
    pub region_id: RegionId,
    /// Cluster name.
    pub name: String,
    /// Cluster code (unique within the region).
    pub code: String,
}

/// Input for updating a cluster.
#[derive(Debug, Clone, Default)]
pub struct UpdateClusterInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for creating a branch.
#[derive(Debug, Clone)]
pub struct CreateBranchInput {
    /// Parent cluster.
    pub cluster_id: ClusterId,
    /// Branch name.
    pub name: String,
    /// Branch code (unique within the cluster).
    pub code: String,
    /// Free-form location.
    pub location: Option<String>,
}

/// Input for updating a branch. A `Some(None)` location clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateBranchInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Repository for the region → cluster → branch hierarchy.
#[derive(Debug, Clone)]
pub struct HierarchyRepository {
    db: DatabaseConnection,
}

impl HierarchyRepository {
    /// Creates a new hierarchy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Regions
    // ========================================================================

    /// Creates a region.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the name or code is taken.
    pub async fn create_region(
        &self,
        input: CreateRegionInput,
    ) -> Result<regions::Model, HierarchyError> {
        let existing = regions::Entity::find()
            .filter(
                regions::Column::Name
                    .eq(&input.name)
                    .or(regions::Column::Code.eq(&input.code)),
            )
            .one(&self.db)
            .await?;

        let label = format!("Region '{}' ({})", input.name, input.code);
        if existing.is_some() {
            return Err(HierarchyError::Duplicate(label));
        }

        regions::ActiveModel {
            id: Set(RegionId::new().into_inner()),
            name: Set(input.name),
            code: Set(input.code),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| HierarchyError::from_write(e, || label))
    }

    /// Lists regions ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_regions(&self, active_only: bool) -> Result<Vec<regions::Model>, HierarchyError> {
        let mut query = regions::Entity::find().order_by_asc(regions::Column::Name);
        if active_only {
            query = query.filter(regions::Column::IsActive.eq(true));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Finds a region by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_region(&self, id: RegionId) -> Result<Option<regions::Model>, HierarchyError> {
        Ok(regions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Updates a region.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Region not found
    /// - New name or code is taken by another region
    pub async fn update_region(
        &self,
        id: RegionId,
        input: UpdateRegionInput,
    ) -> Result<regions::Model, HierarchyError> {
        let region = self
            .find_region(id)
            .await?
            .ok_or(HierarchyError::RegionNotFound(id))?;

        let mut active: regions::ActiveModel = region.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(&self.db)
            .await
            .map_err(|e| HierarchyError::from_write(e, || format!("Region name or code for {id}")))
    }

    // ========================================================================
    // Clusters
    // ========================================================================

    /// Creates a cluster under a region.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Region not found
    /// - Cluster code already exists in the region
    pub async fn create_cluster(
        &self,
        input: CreateClusterInput,
    ) -> Result<clusters::Model, HierarchyError> {
        self.find_region(input.region_id)
            .await?
            .ok_or(HierarchyError::RegionNotFound(input.region_id))?;

        let existing = clusters::Entity::find()
            .filter(clusters::Column::RegionId.eq(input.region_id.into_inner()))
            .filter(clusters::Column::Code.eq(&input.code))
            .one(&self.db)
            .await?;

        let label = format!("Cluster '{}'", input.code);
        if existing.is_some() {
            return Err(HierarchyError::Duplicate(label));
        }

        clusters::ActiveModel {
            id: Set(ClusterId::new().into_inner()),
            region_id: Set(input.region_id.into_inner()),
            name: Set(input.name),
            code: Set(input.code),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| HierarchyError::from_write(e, || label))
    }

    /// Lists active clusters, optionally within one region.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_clusters(
        &self,
        region_id: Option<RegionId>,
    ) -> Result<Vec<clusters::Model>, HierarchyError> {
        let mut query = clusters::Entity::find()
            .filter(clusters::Column::IsActive.eq(true))
            .order_by_asc(clusters::Column::Name);
        if let Some(region_id) = region_id {
            query = query.filter(clusters::Column::RegionId.eq(region_id.into_inner()));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Updates a cluster. Its region stays fixed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cluster not found
    /// - New code is taken within the region
    pub async fn update_cluster(
        &self,
        id: ClusterId,
        input: UpdateClusterInput,
    ) -> Result<clusters::Model, HierarchyError> {
        let cluster = clusters::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(HierarchyError::ClusterNotFound(id))?;

        let mut active: clusters::ActiveModel = cluster.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(&self.db)
            .await
            .map_err(|e| HierarchyError::from_write(e, || format!("Cluster code for {id}")))
    }

    // ========================================================================
    // Branches
    // ========================================================================

    /// Creates a branch under a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cluster not found
    /// - Branch code already exists in the cluster
    pub async fn create_branch(
        &self,
        input: CreateBranchInput,
    ) -> Result<branches::Model, HierarchyError> {
        clusters::Entity::find_by_id(input.cluster_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(HierarchyError::ClusterNotFound(input.cluster_id))?;

        let existing = branches::Entity::find()
            .filter(branches::Column::ClusterId.eq(input.cluster_id.into_inner()))
            .filter(branches::Column::Code.eq(&input.code))
            .one(&self.db)
            .await?;

        let label = format!("Branch '{}'", input.code);
        if existing.is_some() {
            return Err(HierarchyError::Duplicate(label));
        }

        branches::ActiveModel {
            id: Set(BranchId::new().into_inner()),
            cluster_id: Set(input.cluster_id.into_inner()),
            name: Set(input.name),
            code: Set(input.code),
            location: Set(input.location),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| HierarchyError::from_write(e, || label))
    }

    /// Lists active branches, optionally within one cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_branches(
        &self,
        cluster_id: Option<ClusterId>,
    ) -> Result<Vec<branches::Model>, HierarchyError> {
        let mut query = branches::Entity::find()
            .filter(branches::Column::IsActive.eq(true))
            .order_by_asc(branches::Column::Name);
        if let Some(cluster_id) = cluster_id {
            query = query.filter(branches::Column::ClusterId.eq(cluster_id.into_inner()));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Finds a branch by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_branch(&self, id: BranchId) -> Result<Option<branches::Model>, HierarchyError> {
        Ok(branches::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Updates a branch. Its cluster stays fixed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Branch not found
    /// - New code is taken within the cluster
    pub async fn update_branch(
        &self,
        id: BranchId,
        input: UpdateBranchInput,
    ) -> Result<branches::Model, HierarchyError> {
        let branch = self
            .find_branch(id)
            .await?
            .ok_or(HierarchyError::BranchNotFound(id))?;

        let mut active: branches::ActiveModel = branch.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(&self.db)
            .await
            .map_err(|e| HierarchyError::from_write(e, || format!("Branch code for {id}")))
    }

    /// Marks a branch inactive. Its history stays in place.
    ///
    /// # Errors
    ///
    /// Returns `BranchNotFound` if the branch does not exist.
    pub async fn deactivate_branch(&self, id: BranchId) -> Result<branches::Model, HierarchyError> {
        let branch = self
            .find_branch(id)
            .await?
            .ok_or(HierarchyError::BranchNotFound(id))?;

        let mut active: branches::ActiveModel = branch.into();
        active.is_active = Set(false);
        Ok(active.update(&self.db).await?)
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Loads the active hierarchy for analytics, optionally one region only.
    ///
    /// A cluster under an inactive region (or a branch under an inactive
    /// cluster) is left out along with its parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_active_hierarchy(
        &self,
        region_id: Option<RegionId>,
    ) -> Result<Hierarchy, HierarchyError> {
        let mut region_query = regions::Entity::find()
            .filter(regions::Column::IsActive.eq(true))
            .order_by_asc(regions::Column::Name);
        if let Some(region_id) = region_id {
            region_query = region_query.filter(regions::Column::Id.eq(region_id.into_inner()));
        }
        let regions = region_query.all(&self.db).await?;
        let region_ids: Vec<_> = regions.iter().map(|r| r.id).collect();

        let clusters = clusters::Entity::find()
            .filter(clusters::Column::IsActive.eq(true))
            .filter(clusters::Column::RegionId.is_in(region_ids))
            .order_by_asc(clusters::Column::Name)
            .all(&self.db)
            .await?;
        let cluster_ids: Vec<_> = clusters.iter().map(|c| c.id).collect();

        let branches = branches::Entity::find()
            .filter(branches::Column::IsActive.eq(true))
            .filter(branches::Column::ClusterId.is_in(cluster_ids))
            .order_by_asc(branches::Column::Name)
            .all(&self.db)
            .await?;

        Ok(Hierarchy {
            regions: regions
                .into_iter()
                .map(|r| RegionNode {
                    id: RegionId::from_uuid(r.id),
                    name: r.name,
                })
                .collect(),
            clusters: clusters
                .into_iter()
                .map(|c| ClusterNode {
                    id: ClusterId::from_uuid(c.id),
                    region_id: RegionId::from_uuid(c.region_id),
                    name: c.name,
                })
                .collect(),
            branches: branches
                .into_iter()
                .map(|b| BranchNode {
                    id: BranchId::from_uuid(b.id),
                    cluster_id: ClusterId::from_uuid(b.cluster_id),
                    name: b.name,
                })
                .collect(),
        })
    }
}
