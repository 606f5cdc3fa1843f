//! Tours service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::tour::{CreateTour, Tour, TourQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct ToursService {
    repository: Repository,
}

impl ToursService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &TourQuery) -> AppResult<(Vec<Tour>, i64)> {
        self.repository.tours.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Tour> {
        self.repository.tours.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateTour) -> AppResult<Tour> {
        data.validate()?;
        if let (Some(start), Some(end)) = (data.start_date, data.end_date) {
            if start > end {
                return Err(AppError::Validation("start_date must not be after end_date".to_string()));
            }
        }
        self.repository.tours.create(data).await
    }
}
