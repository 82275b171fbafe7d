//! Domain models
//!
//! Entity definitions shared by the repositories, services, and API layer.

pub mod announcement;
pub mod inventory_request;
pub mod login_log;
pub mod reservation;
pub mod room;
pub mod user;

pub use announcement::{Announcement, AnnouncementVisibility};
pub use inventory_request::InventoryRequest;
pub use login_log::LoginLog;
pub use reservation::{Reservation, ReservationStatus};
pub use room::{Room, RoomStatus};
pub use user::{User, UserRole};
