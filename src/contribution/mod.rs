mod controller;
mod events;

pub use controller::ContributionController;
pub use events::DashboardEvent;
