use std::env;
use tracing::warn;

/// Offset used for tenants that do not carry their own zone (America/Sao_Paulo).
pub const DEFAULT_TENANT_UTC_OFFSET_MINUTES: i32 = -180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supabase" => Some(Self::Supabase),
            "memory" | "in-memory" | "in_memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub default_tenant_utc_offset_minutes: i32,
    pub storage_backend: StorageBackend,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            default_tenant_utc_offset_minutes: env::var("DEFAULT_TENANT_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|raw| match raw.parse::<i32>() {
                    Ok(minutes) if (-14 * 60..=14 * 60).contains(&minutes) => Some(minutes),
                    _ => {
                        warn!("DEFAULT_TENANT_UTC_OFFSET_MINUTES is invalid ({}), using default", raw);
                        None
                    }
                })
                .unwrap_or(DEFAULT_TENANT_UTC_OFFSET_MINUTES),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|raw| {
                    let parsed = StorageBackend::parse(&raw);
                    if parsed.is_none() {
                        warn!("Unknown STORAGE_BACKEND {}, using supabase", raw);
                    }
                    parsed
                })
                .unwrap_or(StorageBackend::Supabase),
            port: env::var("PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3000),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_role_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Key used for server-side table access; falls back to the anon key.
    pub fn data_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_storage_backend_aliases() {
        assert_eq!(StorageBackend::parse("memory"), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse(" In-Memory "), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("SUPABASE"), Some(StorageBackend::Supabase));
        assert_eq!(StorageBackend::parse("mongo"), None);
    }

    #[test]
    fn data_api_key_prefers_service_role() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: "secret".to_string(),
            default_tenant_utc_offset_minutes: DEFAULT_TENANT_UTC_OFFSET_MINUTES,
            storage_backend: StorageBackend::Memory,
            port: 3000,
        };
        assert_eq!(config.data_api_key(), "anon");

        config.supabase_service_role_key = "service".to_string();
        assert_eq!(config.data_api_key(), "service");
    }
}
