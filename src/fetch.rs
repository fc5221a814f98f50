//! Data fetch adapter.
//!
//! [`CartographyClient`] is the boundary to the external cartography service.
//! [`load_building_data`] issues the four requests concurrently and joins
//! them into one normalized [`BuildingData`], or fails as a whole.

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};

use crate::protocol::{
    self, BuildingPayload, DatasetPayload, FloorPayload, PoiCategoryPayload, PoiPayload,
};
use crate::types::{BuildingData, BuildingId};

/// Why a load failed.  `Display` is the message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not authorized to access building data")]
    Unauthorized,

    #[error("building {0} not found")]
    NotFound(BuildingId),

    #[error("malformed cartography payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("could not read cartography dataset: {0}")]
    Io(#[from] std::io::Error),
}

/// Port to the cartography service.
#[async_trait]
pub trait CartographyClient: Send + Sync {
    async fn building(&self, building_id: BuildingId) -> Result<BuildingPayload, FetchError>;

    async fn floors(&self, building_id: BuildingId) -> Result<Vec<FloorPayload>, FetchError>;

    async fn pois(&self, building_id: BuildingId) -> Result<Vec<PoiPayload>, FetchError>;

    /// Categories are account-wide, not per building.
    async fn poi_categories(&self) -> Result<Vec<PoiCategoryPayload>, FetchError>;
}

/// Fetch building, floors, POIs and categories in parallel.  The first
/// failure aborts the join; nothing partial is returned.
pub async fn load_building_data<C>(
    client: &C,
    building_id: BuildingId,
) -> Result<BuildingData, FetchError>
where
    C: CartographyClient + ?Sized,
{
    debug!("[fetch] loading building {}", building_id);
    let (building, floors, pois, categories) = tokio::try_join!(
        client.building(building_id),
        client.floors(building_id),
        client.pois(building_id),
        client.poi_categories(),
    )?;

    let data = protocol::normalize(building, floors, pois, categories);
    info!(
        "[fetch] building {} '{}': {} floors, {} POIs, {} categories",
        data.building.id,
        data.building.name,
        data.floors.len(),
        data.pois.len(),
        data.categories.len()
    );
    Ok(data)
}

// ---------------------------------------------------------------------------
// Dataset-backed client
// ---------------------------------------------------------------------------

/// Serves one building from a saved JSON dataset.  Any other id is
/// `NotFound`.
#[derive(Debug, Clone)]
pub struct CartographyDataset {
    dataset: DatasetPayload,
}

impl CartographyDataset {
    pub fn new(dataset: DatasetPayload) -> Self {
        Self { dataset }
    }

    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        debug!("[fetch] reading dataset {}", path.display());
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn building_id(&self) -> BuildingId {
        self.dataset.building.id
    }

    fn check(&self, building_id: BuildingId) -> Result<(), FetchError> {
        if building_id == self.dataset.building.id {
            Ok(())
        } else {
            Err(FetchError::NotFound(building_id))
        }
    }
}

#[async_trait]
impl CartographyClient for CartographyDataset {
    async fn building(&self, building_id: BuildingId) -> Result<BuildingPayload, FetchError> {
        self.check(building_id)?;
        Ok(self.dataset.building.clone())
    }

    async fn floors(&self, building_id: BuildingId) -> Result<Vec<FloorPayload>, FetchError> {
        self.check(building_id)?;
        Ok(self
            .dataset
            .floors
            .iter()
            .filter(|f| f.building_id == building_id)
            .cloned()
            .collect())
    }

    async fn pois(&self, building_id: BuildingId) -> Result<Vec<PoiPayload>, FetchError> {
        self.check(building_id)?;
        Ok(self.dataset.pois.clone())
    }

    async fn poi_categories(&self) -> Result<Vec<PoiCategoryPayload>, FetchError> {
        Ok(self.dataset.categories.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "building": {
            "id": 7033, "name": "Test Building",
            "location": {"lat": 40.416775, "lng": -3.70379},
            "corners": [
                {"lat": 40.416775, "lng": -3.70379}, {"lat": 40.417, "lng": -3.70379},
                {"lat": 40.417, "lng": -3.7035}, {"lat": 40.416775, "lng": -3.7035}
            ]
        },
        "floors": [
            {"id": 1, "buildingId": 7033, "level": 0, "name": "Ground Floor",
             "maps": {"map_url": "https://example.com/floor-0.png"}},
            {"id": 9, "buildingId": 1, "level": 0, "name": "Elsewhere"}
        ],
        "pois": [
            {"id": 1, "name": "Main Entrance", "floorId": 1,
             "location": {"lat": 40.4168, "lng": -3.7037}}
        ],
        "categories": []
    }"#;

    struct Unauthorized;

    #[async_trait]
    impl CartographyClient for Unauthorized {
        async fn building(&self, id: BuildingId) -> Result<BuildingPayload, FetchError> {
            CartographyDataset::from_json(DATASET)?.building(id).await
        }
        async fn floors(&self, _: BuildingId) -> Result<Vec<FloorPayload>, FetchError> {
            Err(FetchError::Unauthorized)
        }
        async fn pois(&self, _: BuildingId) -> Result<Vec<PoiPayload>, FetchError> {
            Ok(Vec::new())
        }
        async fn poi_categories(&self) -> Result<Vec<PoiCategoryPayload>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn dataset_loads_and_scopes_floors_to_building() {
        let client = CartographyDataset::from_json(DATASET).unwrap();
        let data = tokio_test::block_on(load_building_data(&client, 7033)).unwrap();
        assert_eq!(data.building.name, "Test Building");
        assert_eq!(data.building.corners.len(), 4);
        assert_eq!(data.floors.len(), 1);
        assert_eq!(
            data.floors[0].map_url.as_deref(),
            Some("https://example.com/floor-0.png")
        );
        assert_eq!(data.pois.len(), 1);
    }

    #[test]
    fn unknown_building_is_not_found() {
        let client = CartographyDataset::from_json(DATASET).unwrap();
        let err = tokio_test::block_on(load_building_data(&client, 1)).unwrap_err();
        assert!(matches!(err, FetchError::NotFound(1)));
        assert_eq!(err.to_string(), "building 1 not found");
    }

    #[test]
    fn any_failed_request_fails_the_load() {
        let err = tokio_test::block_on(load_building_data(&Unauthorized, 7033)).unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized));
    }

    #[test]
    fn malformed_dataset_is_decode_error() {
        let err = CartographyDataset::from_json("{\"building\": 3}").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = CartographyDataset::from_path("/nonexistent/indoor-map.json")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
