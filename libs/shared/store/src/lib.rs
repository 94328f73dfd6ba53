pub mod state;
pub mod store;

pub use state::AppState;
pub use store::{CascadeFailure, ClinicStore};
