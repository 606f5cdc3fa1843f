//! Business logic services

pub mod availability;
pub mod bookings;
pub mod gateway;
pub mod payments;
pub mod tours;
pub mod users;

use std::sync::Arc;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub availability: availability::AvailabilityService,
    pub bookings: bookings::BookingsService,
    pub payments: payments::PaymentsService,
    pub tours: tours::ToursService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services over one repository and payment gateway
    pub fn new(repository: Repository, gateway: Arc<dyn gateway::PaymentGateway>) -> Self {
        Self {
            availability: availability::AvailabilityService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), gateway.clone()),
            payments: payments::PaymentsService::new(repository.clone(), gateway),
            tours: tours::ToursService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            repository,
        }
    }
}
