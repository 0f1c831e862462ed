pub mod interceptor;
pub mod manager;
pub mod service;

pub use interceptor::SchoolsInterceptor;
pub use manager::SchoolsManager;
