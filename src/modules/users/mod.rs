pub mod interceptor;
pub mod manager;
pub mod service;

pub use interceptor::UsersInterceptor;
pub use manager::UsersManager;
