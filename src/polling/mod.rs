pub mod controller;
pub mod poller;
pub mod state;

pub use controller::ResultsController;
pub use poller::{poll_until, PollConfig, PollOutcome};
pub use state::{ResultsState, UnavailableReason, ViewStatus};
