pub mod appointment;
pub mod availability;
pub mod billing;
pub mod error;
pub mod events;
pub mod patient;
pub mod role;

pub use appointment::*;
pub use availability::*;
pub use billing::*;
pub use error::*;
pub use events::*;
pub use patient::*;
pub use role::*;
