//! Remedy catalog endpoints - no model needed

use axum::Json;
use leafcure::remedy::{self, Advisory, REMEDY_CATALOG};
use serde::{Deserialize, Serialize};

/// One catalog entry, in matching order
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub position: usize,
    pub keyword: &'static str,
    pub advisory: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RemedyRequest {
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct RemedyResponse {
    /// Display form of the label
    pub label: String,
    /// Lower-cased form the catalog was matched against
    pub normalized: String,
    pub advisory: Advisory,
    pub unknown_disease: bool,
}

/// GET /catalog - List the remedy catalog
pub async fn list_catalog() -> Json<Vec<CatalogEntry>> {
    Json(
        REMEDY_CATALOG
            .iter()
            .enumerate()
            .map(|(position, &(keyword, advisory))| CatalogEntry {
                position,
                keyword,
                advisory,
            })
            .collect(),
    )
}

/// POST /remedy - Resolve a label to its advisory
pub async fn resolve_remedy(Json(req): Json<RemedyRequest>) -> Json<RemedyResponse> {
    let (normalized, advisory) = remedy::lookup(&req.label);
    Json(RemedyResponse {
        label: normalized.display,
        normalized: normalized.matching,
        unknown_disease: advisory.is_unknown(),
        advisory,
    })
}
