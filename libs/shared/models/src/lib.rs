pub mod appointment;
pub mod auth;
pub mod doctor;
pub mod error;
pub mod time_format;

pub use appointment::*;
pub use doctor::*;
