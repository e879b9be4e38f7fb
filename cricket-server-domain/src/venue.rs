use std::sync::Arc;

use dashmap::DashMap;

use crate::{ServiceResult, VenueId};

#[derive(Clone, Debug, PartialEq)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub city: String,
    pub capacity: u32,
}

#[async_trait::async_trait]
pub trait VenueRepository {
    async fn get_venues(&self) -> ServiceResult<Vec<Venue>>;
}

#[derive(Clone, Default)]
pub struct MockVenueRepository {
    pub venues: Arc<DashMap<VenueId, Venue>>,
}

#[allow(unused)]
impl MockVenueRepository {
    pub fn with_venues(venues: Vec<Venue>) -> Self {
        let repo = Self::default();
        for venue in venues {
            repo.venues.insert(venue.id, venue);
        }
        repo
    }
}

#[async_trait::async_trait]
impl VenueRepository for MockVenueRepository {
    async fn get_venues(&self) -> ServiceResult<Vec<Venue>> {
        let mut venues: Vec<Venue> = self
            .venues
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        venues.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(venues)
    }
}
