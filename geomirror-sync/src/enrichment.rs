//! Read-side enrichment of mirrored features.

use crate::error::SyncResult;
use geomirror_storage::{LocalAttachment, LocalFeature, LocalStore};
use serde::Serialize;

/// Municipality data joined onto a feature by region name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityInfo {
    pub name: String,
    pub geom: String,
}

/// A mirrored feature as served by local read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureView {
    #[serde(flatten)]
    pub feature: LocalFeature,
    pub attachments: Vec<LocalAttachment>,
    /// Omitted when the region is empty or names no known municipality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<MunicipalityInfo>,
}

#[derive(Clone)]
pub struct Enricher {
    store: LocalStore,
}

impl Enricher {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Joins a feature with its attachments and, when `n_raion` exactly
    /// matches a municipality name, that municipality.
    pub fn enrich(&self, feature: LocalFeature) -> SyncResult<FeatureView> {
        let attachments = self.store.list_attachments(feature.id)?;
        let municipality = match feature.columns.n_raion.as_deref() {
            Some(region) if !region.is_empty() => self
                .store
                .find_municipality_by_name(region)?
                .map(|m| MunicipalityInfo {
                    name: m.name,
                    geom: m.geom,
                }),
            _ => None,
        };
        Ok(FeatureView {
            feature,
            attachments,
            municipality,
        })
    }

    /// Local page of features, each enriched.
    pub fn list(&self, skip: u32, limit: u32) -> SyncResult<Vec<FeatureView>> {
        self.store
            .list_features(skip, limit)?
            .into_iter()
            .map(|f| self.enrich(f))
            .collect()
    }

    /// One feature by local id, enriched.
    pub fn get(&self, local_id: i64) -> SyncResult<FeatureView> {
        let feature = self.store.get_feature(local_id)?;
        self.enrich(feature)
    }
}
