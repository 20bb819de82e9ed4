//! The four-level service catalog: category → subcategory → path → leaf service.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::provider_service::ProviderService;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ServiceSubcategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ServicePath {
    pub id: Uuid,
    pub subcategory_id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub sort_order: i32,
}

/// A leaf service. `subcategory_id` and `category_id` are resolved by join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct LegalService {
    pub id: Uuid,
    pub path_id: Uuid,
    pub subcategory_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Admin create DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateCategoryRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateSubcategoryRequest {
    pub category_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreatePathRequest {
    pub subcategory_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateLegalServiceRequest {
    pub path_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query params for listing subcategories.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SubcategoryListParams {
    pub category_id: Option<Uuid>,
}

/// Query params for listing paths.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PathListParams {
    pub subcategory_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Leaf-service filter. Doubles as the query string of the listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ServiceFilter {
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub path_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub mine_only: bool,
}

/// Filter leaf services in memory.
///
/// `search` is a case-insensitive substring match over name and description.
/// `mine_only` keeps exactly the services that have an active row in
/// `provider_rows`.
pub fn filter_services<'a>(
    services: &'a [LegalService],
    provider_rows: &[ProviderService],
    filter: &ServiceFilter,
) -> Vec<&'a LegalService> {
    let mine: HashSet<Uuid> = provider_rows
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.service_id)
        .collect();

    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    services
        .iter()
        .filter(|s| filter.category_id.map_or(true, |id| s.category_id == id))
        .filter(|s| filter.subcategory_id.map_or(true, |id| s.subcategory_id == id))
        .filter(|s| filter.path_id.map_or(true, |id| s.path_id == id))
        .filter(|s| !filter.mine_only || mine.contains(&s.id))
        .filter(|s| match &needle {
            None => true,
            Some(n) => {
                s.name.to_lowercase().contains(n)
                    || s
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(n))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tree view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PathNode {
    #[serde(flatten)]
    pub path: ServicePath,
    pub services: Vec<LegalService>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubcategoryNode {
    #[serde(flatten)]
    pub subcategory: ServiceSubcategory,
    pub paths: Vec<PathNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: ServiceCategory,
    pub subcategories: Vec<SubcategoryNode>,
}

/// Assemble the nested catalog from the four flat lists.
///
/// Input order is preserved at every level. Rows whose parent is missing
/// are dropped.
pub fn build_catalog_tree(
    categories: Vec<ServiceCategory>,
    subcategories: Vec<ServiceSubcategory>,
    paths: Vec<ServicePath>,
    services: Vec<LegalService>,
) -> Vec<CategoryNode> {
    let mut services_by_path: HashMap<Uuid, Vec<LegalService>> = HashMap::new();
    for s in services {
        services_by_path.entry(s.path_id).or_default().push(s);
    }

    let mut paths_by_sub: HashMap<Uuid, Vec<PathNode>> = HashMap::new();
    for p in paths {
        let services = services_by_path.remove(&p.id).unwrap_or_default();
        paths_by_sub
            .entry(p.subcategory_id)
            .or_default()
            .push(PathNode { path: p, services });
    }

    let mut subs_by_cat: HashMap<Uuid, Vec<SubcategoryNode>> = HashMap::new();
    for sc in subcategories {
        let paths = paths_by_sub.remove(&sc.id).unwrap_or_default();
        subs_by_cat
            .entry(sc.category_id)
            .or_default()
            .push(SubcategoryNode { subcategory: sc, paths });
    }

    categories
        .into_iter()
        .map(|c| {
            let subcategories = subs_by_cat.remove(&c.id).unwrap_or_default();
            CategoryNode { category: c, subcategories }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Bulk enable
// ---------------------------------------------------------------------------

/// Level of the taxonomy a bulk action targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BulkScope {
    Category,
    Subcategory,
    Path,
}

impl BulkScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkScope::Category => "category",
            BulkScope::Subcategory => "subcategory",
            BulkScope::Path => "path",
        }
    }

    /// Whether `service` sits under the branch rooted at `id`.
    pub fn contains(&self, id: Uuid, service: &LegalService) -> bool {
        match self {
            BulkScope::Category => service.category_id == id,
            BulkScope::Subcategory => service.subcategory_id == id,
            BulkScope::Path => service.path_id == id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkEnableRequest {
    pub scope: BulkScope,
    pub id: Uuid,
}

/// Which leaf services a bulk enable will insert.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkEnablePlan {
    pub total_in_branch: usize,
    pub already_enabled: usize,
    pub to_enable: Vec<Uuid>,
}

/// Plan a bulk enable over the active leaf services under `scope`/`id`.
///
/// A service counts as already enabled only when its provider row is active;
/// inactive rows are planned again so they get reactivated.
pub fn plan_bulk_enable(
    services: &[LegalService],
    provider_rows: &[ProviderService],
    scope: BulkScope,
    id: Uuid,
) -> BulkEnablePlan {
    let enabled: HashSet<Uuid> = provider_rows
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.service_id)
        .collect();

    let branch: Vec<&LegalService> = services
        .iter()
        .filter(|s| s.is_active && scope.contains(id, s))
        .collect();

    let to_enable: Vec<Uuid> = branch
        .iter()
        .filter(|s| !enabled.contains(&s.id))
        .map(|s| s.id)
        .collect();

    BulkEnablePlan {
        total_in_branch: branch.len(),
        already_enabled: branch.len() - to_enable.len(),
        to_enable,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkEnableResponse {
    pub scope: BulkScope,
    pub total_in_branch: usize,
    pub already_enabled: usize,
    pub enabled: usize,
}
