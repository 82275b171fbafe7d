//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the store operations for a specific entity.

pub mod announcement;
pub mod inventory_request;
pub mod login_log;
pub mod reservation;
pub mod room;
pub mod user;

pub use announcement::{AnnouncementRepository, SqlxAnnouncementRepository};
pub use inventory_request::{InventoryRequestRepository, SqlxInventoryRequestRepository};
pub use login_log::{LoginLogRepository, SqlxLoginLogRepository};
pub use reservation::{ReservationRepository, SqlxReservationRepository};
pub use room::{RoomRepository, RoomSearch, SqlxRoomRepository};
pub use user::{SqlxUserRepository, UserRepository};
