use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub service_name: String,
    pub user_port: u16,
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: "scholaris".to_string(),
            user_port: 5111,
            metrics_port: 9100,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env_or("SERVICE_NAME", defaults.service_name),
            user_port: env_or("USER_PORT", defaults.user_port),
            metrics_port: env_or("METRICS_PORT", defaults.metrics_port),
        }
    }
}
