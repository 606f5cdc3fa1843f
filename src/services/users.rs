//! User profile service

use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Update contact details of the calling user
    pub async fn update_profile(&self, id: i32, data: &UpdateProfile) -> AppResult<User> {
        data.validate()?;
        self.repository.users.update_profile(id, data).await
    }
}
