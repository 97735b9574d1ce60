// Data models shared by the pipeline, services and API

pub mod admin;
pub mod analysis;
pub mod feedback;
pub mod label;
pub mod user;
pub mod video;

pub use admin::*;
pub use analysis::*;
pub use feedback::*;
pub use label::*;
pub use user::*;
pub use video::*;
