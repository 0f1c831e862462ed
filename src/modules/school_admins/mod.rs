pub mod manager;
pub mod service;

pub use manager::SchoolAdminsManager;
