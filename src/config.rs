use std::env;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub auth_secret: String,
    pub token_ttl_hours: i64,
    pub client_url: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "daybook.db".to_string()),
            auth_secret: env::var("AUTH_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            token_ttl_hours: parse_ttl_hours(env::var("TOKEN_TTL_HOURS").ok().as_deref()),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@daybook.local".to_string()),
        }
    }
}

fn parse_ttl_hours(value: Option<&str>) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_hours_parses() {
        assert_eq!(parse_ttl_hours(Some("12")), 12);
        assert_eq!(parse_ttl_hours(Some(" 48 ")), 48);
    }

    #[test]
    fn test_ttl_hours_falls_back_to_default() {
        assert_eq!(parse_ttl_hours(None), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_ttl_hours(Some("soon")), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_ttl_hours(Some("0")), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_ttl_hours(Some("-5")), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(
            parse_ttl_hours(Some(&i64::MAX.to_string())),
            DEFAULT_TOKEN_TTL_HOURS
        );
    }
}
