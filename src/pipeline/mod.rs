pub mod controller;
pub mod state;
pub mod store;

pub use controller::{Controller, IngestSettings};
pub use state::{Mode, SessionState};
pub use store::StateStore;
