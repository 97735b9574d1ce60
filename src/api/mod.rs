// API routes and handlers

pub mod admin;
pub mod auth;
pub mod error;
pub mod feedback;
pub mod health;
pub mod routes;
pub mod state;
pub mod video;

pub use error::ApiError;
pub use routes::create_routes;
pub use state::AppState;
