//! Shared application state and the startup-time wiring that assembles it:
//! provider selection, the Orchestrator's callback wiring, and the
//! External Event Bridge.

use std::sync::{Arc, Weak};

use telegate_bridge::{Bridge, BridgeConfig};
use telegate_config::Settings;
use telegate_core::{EgressStore, MetricsStore, SessionStore};
use telegate_pipeline::{Orchestrator, OrchestratorConfig};
use telegate_providers::{
    HttpSttProvider, HttpTranslationProvider, HttpTtsProvider, StreamingSttProvider,
    StubSttProvider, StubTranslationProvider, StubTtsProvider, TranslationProvider, TtsProvider,
};

use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionStore>,
    pub egress: Arc<EgressStore>,
    pub metrics: Arc<MetricsStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub bridge: Option<Arc<Bridge>>,
}

fn select_stt(settings: &Settings) -> Result<Box<dyn StreamingSttProvider>, ServerError> {
    match &settings.stt_credentials {
        creds if creds.is_configured() => {
            let url = creds.endpoint_url.clone().expect("checked by is_configured");
            HttpSttProvider::new(url, 2000)
                .map(|p| Box::new(p) as Box<dyn StreamingSttProvider>)
                .map_err(|e| ServerError::Internal(e.to_string()))
        }
        _ => Ok(Box::new(StubSttProvider::new(settings.stub_stt_text.clone()))),
    }
}

fn select_translation(settings: &Settings) -> Result<Box<dyn TranslationProvider>, ServerError> {
    match &settings.translation_credentials {
        creds if creds.is_configured() => {
            let url = creds.endpoint_url.clone().expect("checked by is_configured");
            HttpTranslationProvider::new(url, 2000)
                .map(|p| Box::new(p) as Box<dyn TranslationProvider>)
                .map_err(|e| ServerError::Internal(e.to_string()))
        }
        _ => Ok(Box::new(StubTranslationProvider)),
    }
}

fn select_tts(settings: &Settings) -> Result<Box<dyn TtsProvider>, ServerError> {
    match &settings.tts_credentials {
        creds if creds.is_configured() => {
            let url = creds.endpoint_url.clone().expect("checked by is_configured");
            HttpTtsProvider::new(url, 2000)
                .map(|p| Box::new(p) as Box<dyn TtsProvider>)
                .map_err(|e| ServerError::Internal(e.to_string()))
        }
        _ => Ok(Box::new(StubTtsProvider)),
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, ServerError> {
        let settings = Arc::new(settings);
        let sessions = Arc::new(SessionStore::new());
        let egress = Arc::new(EgressStore::new(settings.egress_max_queue_per_session));
        let metrics = Arc::new(MetricsStore::new());

        let bridge = match &settings.openclaw_bridge_url {
            Some(url) => {
                let bridge = Bridge::spawn(BridgeConfig {
                    endpoint_url: url.clone(),
                    api_key: settings.openclaw_bridge_api_key.clone(),
                    timeout_ms: settings.openclaw_bridge_timeout_ms,
                })
                .map_err(|e| ServerError::Internal(e.to_string()))?;
                Some(Arc::new(bridge))
            }
            None => None,
        };

        let stt = select_stt(&settings)?;
        let translation = select_translation(&settings)?;
        let tts = select_tts(&settings)?;

        let orchestrator_config = OrchestratorConfig {
            outbound_target: settings.outbound_target_e164.clone(),
            min_frame_interval_ms: settings.pipeline_min_frame_interval_ms,
        };

        let egress_for_tts = egress.clone();
        let bridge_for_events = bridge.clone();

        let orchestrator = Arc::new_cyclic(|weak: &Weak<Orchestrator>| {
            let weak_for_tts = weak.clone();
            Orchestrator::new(
                sessions.clone(),
                metrics.clone(),
                stt,
                translation,
                tts,
                orchestrator_config,
            )
            .on_tts_chunk(move |chunk| {
                let outcome = egress_for_tts.enqueue(&chunk.session_id, chunk.clone());
                if let Some(orchestrator) = weak_for_tts.upgrade() {
                    orchestrator.report_egress_stats(
                        &chunk.session_id,
                        outcome.queue_len,
                        outcome.dropped_oldest,
                    );
                }
            })
            .on_session_event(move |event| {
                if let Some(bridge) = &bridge_for_events {
                    bridge.publish_session_event(event);
                }
            })
        });

        Ok(Self {
            settings,
            sessions,
            egress,
            metrics,
            orchestrator,
            bridge,
        })
    }
}
