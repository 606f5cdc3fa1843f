//! Seat inventory for tour dates

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{parse_tour_date, Availability, AvailabilityRequest},
        tour::Tour,
    },
    repository::Repository,
};

pub const OUTSIDE_TOUR_DATES: &str = "outside tour dates";
pub const NOT_ENOUGH_SEATS: &str = "Not enough seats available for selected date";
pub const AVAILABLE: &str = "Tour is available for the selected date";

/// Capacity of one tour date against the seats already held on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatInventory {
    pub max_guest: i64,
    pub already_booked: i64,
}

impl SeatInventory {
    /// Remaining seats; negative when the date is overbooked
    pub fn remaining(&self) -> i64 {
        self.max_guest - self.already_booked
    }

    pub fn fits(&self, guest_count: i64) -> bool {
        self.remaining() >= guest_count
    }
}

/// Whether a date lies in the tour window. Tours without a window have no
/// bookable dates to check against and are rejected.
pub fn within_window(tour: &Tour, date: NaiveDate) -> AppResult<bool> {
    let (start, end) = tour.window().ok_or_else(|| {
        AppError::BadRequest(format!("Tour {} has no start or end date", tour.id))
    })?;
    Ok(date >= start && date <= end)
}

/// Availability answer for a tour date
pub fn evaluate(tour: &Tour, date: NaiveDate, already_booked: i64, guest_count: i64) -> AppResult<Availability> {
    if !within_window(tour, date)? {
        return Ok(Availability {
            available: false,
            remaining_seats: 0,
            message: OUTSIDE_TOUR_DATES.to_string(),
        });
    }

    let inventory = SeatInventory {
        max_guest: tour.max_guest as i64,
        already_booked,
    };

    let available = inventory.fits(guest_count);
    Ok(Availability {
        available,
        remaining_seats: inventory.remaining(),
        message: if available { AVAILABLE } else { NOT_ENOUGH_SEATS }.to_string(),
    })
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
}

impl AvailabilityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Advisory availability check; reserves nothing
    pub async fn check(&self, request: &AvailabilityRequest) -> AppResult<Availability> {
        request.validate()?;
        let date = parse_tour_date(&request.date)?;
        let tour = self.repository.tours.get_by_id(request.tour).await?;

        // No seat count needed for windowless tours or out-of-window dates
        if !within_window(&tour, date)? {
            return evaluate(&tour, date, 0, request.guest_count as i64);
        }

        let already_booked = self.repository.bookings.booked_seats_now(tour.id, date).await?;
        evaluate(&tour, date, already_booked, request.guest_count as i64)
    }
}
