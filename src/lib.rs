pub mod api_router;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod departments;
pub mod goals;
pub mod next_actions;
pub mod one_on_ones;
pub mod permissions;
pub mod shared;
pub mod users;
