//! Visitor session resolution and the session cookie.
//!
//! Scan logging trusts the id the page sends over the cookie; social-click
//! logging trusts the cookie over the page. When neither is usable a new id
//! is generated and handed back in the cookie.

use axum::http::{HeaderMap, header::USER_AGENT};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use qrpulse_core::session::SessionKey;
use qrpulse_db::repositories::ClientDetails;
use qrpulse_shared::config::MAX_CONFIG_DAYS;
use qrpulse_shared::{CookieSameSite, SessionConfig};

/// Which source wins when both carry a session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPriority {
    /// Request body first, then cookie.
    BodyFirst,
    /// Cookie first, then request body.
    CookieFirst,
}

/// Resolves the session for a request.
pub fn resolve_session(
    jar: &CookieJar,
    config: &SessionConfig,
    body_session: Option<&str>,
    priority: SessionPriority,
) -> SessionKey {
    let cookie_session = jar.get(&config.cookie_name).map(Cookie::value);
    let candidates = match priority {
        SessionPriority::BodyFirst => [body_session, cookie_session],
        SessionPriority::CookieFirst => [cookie_session, body_session],
    };

    let resolved = SessionKey::resolve(candidates);
    if resolved.synthesized {
        tracing::warn!(
            session = %resolved.key.log_prefix(),
            "No usable session id on request, generated one"
        );
    }
    resolved.key
}

/// Builds the long-lived session cookie.
pub fn session_cookie(key: &SessionKey, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), key.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(same_site(config.cookie_same_site))
        .secure(config.cookie_secure || config.cookie_same_site == CookieSameSite::None)
        .max_age(time_days(config.cookie_max_age_days))
        .build()
}

fn same_site(policy: CookieSameSite) -> SameSite {
    match policy {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    }
}

fn time_days(days: i64) -> time::Duration {
    time::Duration::days(days.clamp(0, MAX_CONFIG_DAYS))
}

/// Client IP from the first `X-Forwarded-For` hop, then `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}

/// Device and location details as supplied by the client.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ClientFields {
    /// Raw user agent; falls back to the request header.
    pub user_agent: Option<String>,
    /// Device class.
    pub device_type: Option<String>,
    /// Browser name.
    pub browser: Option<String>,
    /// Operating system.
    pub os: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// City.
    pub city: Option<String>,
}

impl ClientFields {
    /// Merges body fields with request headers.
    pub fn into_details(self, headers: &HeaderMap) -> ClientDetails {
        let header_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        ClientDetails {
            device_type: self.device_type,
            browser: self.browser,
            os: self.os,
            ip_address: client_ip(headers),
            country: self.country,
            city: self.city,
            user_agent: self.user_agent.filter(|ua| !ua.is_empty()).or(header_agent),
        }
    }
}
