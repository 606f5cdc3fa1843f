//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{bookings, health, payments, tours, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TriPlan API",
        version = "0.3.0",
        description = "Tour booking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Bookings
        bookings::create_booking,
        bookings::check_availability,
        bookings::check_availability_query,
        bookings::list_bookings,
        bookings::my_bookings,
        bookings::get_booking,
        bookings::cancel_booking,
        // Payments
        payments::payment_success,
        payments::payment_fail,
        payments::payment_cancel,
        payments::init_payment,
        payments::get_payment,
        // Tours
        tours::list_tours,
        tours::get_tour,
        tours::create_tour,
        // Users
        users::me,
        users::update_me,
    ),
    components(
        schemas(
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::BookingUser,
            crate::models::booking::BookingDetails,
            crate::models::booking::CreateBooking,
            crate::models::booking::AvailabilityRequest,
            crate::models::booking::Availability,
            bookings::CreateBookingResponse,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::PaymentStatus,
            crate::models::payment::PaymentOutcome,
            payments::PaymentUrlResponse,
            // Tours
            crate::models::tour::Tour,
            crate::models::tour::TourSummary,
            crate::models::tour::CreateTour,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UpdateProfile,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "bookings", description = "Tour bookings and seat availability"),
        (name = "payments", description = "Payment gateway callbacks and sessions"),
        (name = "tours", description = "Tour catalog"),
        (name = "users", description = "Current user profile")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
