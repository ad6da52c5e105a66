//! Flat, environment-variable-driven settings.
//!
//! Unlike the reference codebase's layered `config::Config` builder (files +
//! env merged with precedence), this gateway has a small enough surface that
//! plain `std::env::var` reads are clearer and have no merge-order surprises.

use telegate_core::validate_e164;

use crate::error::ConfigError;

fn env_var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env_var(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
            reason: "not a valid number".to_string(),
        }),
    }
}

/// Per-capability credentials. An empty set selects the stub implementation
/// for that capability; presence of both fields selects the HTTP-backed one.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
}

impl ProviderCredentials {
    fn from_env(endpoint_var: &'static str, api_key_var: &'static str) -> Self {
        Self {
            endpoint_url: env_var(endpoint_var),
            api_key: env_var(api_key_var),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint_url.is_some()
    }
}

/// Everything the gateway needs at startup, read once from the process
/// environment and validated eagerly so misconfiguration is startup-fatal
/// rather than a runtime surprise.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub log_level: String,

    pub outbound_target_e164: String,
    pub public_base_url: Option<String>,

    pub asterisk_shared_secret: Option<String>,
    pub control_api_secret: Option<String>,
    pub twilio_auth_token: Option<String>,

    pub pipeline_min_frame_interval_ms: u64,
    pub egress_max_queue_per_session: usize,

    pub stt_credentials: ProviderCredentials,
    pub translation_credentials: ProviderCredentials,
    pub tts_credentials: ProviderCredentials,
    pub stub_stt_text: String,

    pub openclaw_bridge_url: Option<String>,
    pub openclaw_bridge_api_key: Option<String>,
    pub openclaw_bridge_timeout_ms: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env("PORT", 8080u16)?;
        let log_level = env_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        // OUTBOUND_TARGET_E164 wins over the legacy DESTINATION_PHONE_E164
        // name when both are set; the legacy name is a fallback read only.
        let outbound_target_e164 = env_var("OUTBOUND_TARGET_E164")
            .or_else(|| env_var("DESTINATION_PHONE_E164"))
            .ok_or(ConfigError::Missing("OUTBOUND_TARGET_E164"))?;
        let outbound_target_e164 =
            validate_e164(&outbound_target_e164).map_err(|e| ConfigError::InvalidE164(e.to_string()))?;

        let public_base_url = env_var("PUBLIC_BASE_URL");
        let twilio_auth_token = env_var("TWILIO_AUTH_TOKEN");

        if twilio_auth_token.is_some() {
            let base_url_is_https = public_base_url
                .as_deref()
                .map(|url| url.starts_with("https://"))
                .unwrap_or(false);
            if !base_url_is_https {
                return Err(ConfigError::Invalid {
                    name: "PUBLIC_BASE_URL",
                    value: public_base_url.clone().unwrap_or_default(),
                    reason: "must be an https:// URL when TWILIO_AUTH_TOKEN is set".to_string(),
                });
            }
        }

        let pipeline_min_frame_interval_ms = parse_env("PIPELINE_MIN_FRAME_INTERVAL_MS", 400u64)?;

        let egress_max_queue_per_session = parse_env("EGRESS_MAX_QUEUE_PER_SESSION", 64usize)?;
        if egress_max_queue_per_session < 1 {
            return Err(ConfigError::Invalid {
                name: "EGRESS_MAX_QUEUE_PER_SESSION",
                value: egress_max_queue_per_session.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let openclaw_bridge_timeout_ms = parse_env("OPENCLAW_BRIDGE_TIMEOUT_MS", 1200u64)?;
        if openclaw_bridge_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                name: "OPENCLAW_BRIDGE_TIMEOUT_MS",
                value: openclaw_bridge_timeout_ms.to_string(),
                reason: "must be at least 100".to_string(),
            });
        }

        let stt_credentials = ProviderCredentials::from_env("STT_ENDPOINT_URL", "STT_API_KEY");
        let translation_credentials =
            ProviderCredentials::from_env("TRANSLATION_ENDPOINT_URL", "TRANSLATION_API_KEY");
        let tts_credentials = ProviderCredentials::from_env("TTS_ENDPOINT_URL", "TTS_API_KEY");
        let openclaw_bridge_url = env_var("OPENCLAW_BRIDGE_URL");

        tracing::info!(
            port,
            outbound_target = %outbound_target_e164,
            stt_provider = if stt_credentials.is_configured() { "http" } else { "stub" },
            translation_provider = if translation_credentials.is_configured() { "http" } else { "stub" },
            tts_provider = if tts_credentials.is_configured() { "http" } else { "stub" },
            bridge_configured = openclaw_bridge_url.is_some(),
            "settings loaded"
        );

        Ok(Self {
            port,
            log_level,
            outbound_target_e164,
            public_base_url,
            asterisk_shared_secret: env_var("ASTERISK_SHARED_SECRET"),
            control_api_secret: env_var("CONTROL_API_SECRET"),
            twilio_auth_token,
            pipeline_min_frame_interval_ms,
            egress_max_queue_per_session,
            stt_credentials,
            translation_credentials,
            tts_credentials,
            stub_stt_text: env_var("STUB_STT_TEXT").unwrap_or_else(|| "hola mundo".to_string()),
            openclaw_bridge_url,
            openclaw_bridge_api_key: env_var("OPENCLAW_BRIDGE_API_KEY"),
            openclaw_bridge_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Settings::from_env reads process-global state; serialize tests that
    // touch it so they don't interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for var in [
            "PORT",
            "LOG_LEVEL",
            "OUTBOUND_TARGET_E164",
            "DESTINATION_PHONE_E164",
            "PUBLIC_BASE_URL",
            "TWILIO_AUTH_TOKEN",
            "PIPELINE_MIN_FRAME_INTERVAL_MS",
            "EGRESS_MAX_QUEUE_PER_SESSION",
            "OPENCLAW_BRIDGE_TIMEOUT_MS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn fails_without_outbound_target() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        assert!(matches!(
            Settings::from_env(),
            Err(ConfigError::Missing("OUTBOUND_TARGET_E164"))
        ));
    }

    #[test]
    fn legacy_destination_phone_is_a_fallback() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("DESTINATION_PHONE_E164", "+15555550100");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.outbound_target_e164, "+15555550100");
        clear_all();
    }

    #[test]
    fn canonical_name_wins_when_both_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("OUTBOUND_TARGET_E164", "+15555550111");
        std::env::set_var("DESTINATION_PHONE_E164", "+15555550100");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.outbound_target_e164, "+15555550111");
        clear_all();
    }

    #[test]
    fn twilio_token_requires_https_base_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("OUTBOUND_TARGET_E164", "+15555550111");
        std::env::set_var("TWILIO_AUTH_TOKEN", "secret");
        std::env::set_var("PUBLIC_BASE_URL", "http://example.com");
        assert!(Settings::from_env().is_err());
        clear_all();
    }

    #[test]
    fn defaults_are_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("OUTBOUND_TARGET_E164", "+15555550111");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.pipeline_min_frame_interval_ms, 400);
        assert_eq!(settings.egress_max_queue_per_session, 64);
        assert_eq!(settings.openclaw_bridge_timeout_ms, 1200);
        clear_all();
    }
}
