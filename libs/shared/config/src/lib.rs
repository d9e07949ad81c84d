use std::env;

use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    /// IANA zone the clinic's calendar days are counted in.
    pub clinic_timezone: Tz,
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
            clinic_timezone: match env::var("CLINIC_TIMEZONE") {
                Ok(name) => parse_timezone(&name),
                Err(_) => {
                    warn!("CLINIC_TIMEZONE not set, using UTC");
                    Tz::UTC
                }
            },
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using default 3000");
                    3000
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if !config.can_reserve_queue_numbers() {
            warn!("SUPABASE_SERVICE_ROLE_KEY is empty, check-in cannot reserve queue numbers");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// `reserve_queue_number` is only executable by the service role.
    pub fn can_reserve_queue_numbers(&self) -> bool {
        !self.supabase_service_role_key.is_empty()
    }

    /// Key used for server-side Directory access. Falls back to the anon key
    /// when no service role key is configured.
    pub fn directory_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("CLINIC_TIMEZONE '{}' is not a known IANA zone, using UTC", name);
        Tz::UTC
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone_known_zone() {
        assert_eq!(parse_timezone("Asia/Kolkata"), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_parse_timezone_falls_back_to_utc() {
        assert_eq!(parse_timezone("Mars/Olympus_Mons"), Tz::UTC);
    }

    #[test]
    fn test_directory_key_prefers_service_role() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: "secret".to_string(),
            clinic_timezone: Tz::UTC,
            port: 3000,
        };
        assert_eq!(config.directory_key(), "anon");
        assert!(!config.can_reserve_queue_numbers());

        config.supabase_service_role_key = "service".to_string();
        assert_eq!(config.directory_key(), "service");
        assert!(config.can_reserve_queue_numbers());
        assert!(config.is_configured());
    }
}
