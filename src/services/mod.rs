//! Business logic services
//!
//! Services sit between the HTTP handlers and the repositories. Handlers
//! translate service errors into API responses; services own validation
//! and the booking concurrency rules.

pub mod password;
pub mod reservation;
pub mod token;
pub mod user;

pub use reservation::{ReservationError, ReservationRequest, ReservationService};
pub use token::{Claims, TokenService};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
