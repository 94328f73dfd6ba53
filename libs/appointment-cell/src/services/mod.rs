pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod sync;

pub use booking::AppointmentBookingService;
pub use conflict::ConflictChecker;
pub use lifecycle::AppointmentLifecycleService;
pub use sync::BillingSyncService;
