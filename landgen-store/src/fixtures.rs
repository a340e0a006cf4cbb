use landgen_core::{
    Branch, Client, Location, Offer, Page, Service, ServiceArea, StaffMember, StoreError,
    StoreResult, Testimonial,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every table of the record store in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub service_areas: Vec<ServiceArea>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
}

impl Dataset {
    pub async fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Backend(format!("reading {}: {}", path.display(), e)))?;

        serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
            table: "dataset",
            id: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn write_to(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| StoreError::Backend(format!("writing {}: {}", path.display(), e)))
    }
}
