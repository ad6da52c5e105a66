//! Stub providers: no external calls, no credentials. Selected whenever a
//! capability's endpoint URL is not configured, so the gateway is fully
//! smoke-testable without cloud access.

use async_trait::async_trait;

use telegate_core::{
    AudioEncoding, AudioFrame, LanguageCode, TranscriptionChunk, TranslationChunk, TtsChunk,
};

use crate::traits::{StreamingSttProvider, TranslationProvider, TtsProvider};

/// Always reports the same configured text as "transcribed", final, in the
/// expected language.
pub struct StubSttProvider {
    text: String,
}

impl StubSttProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl StreamingSttProvider for StubSttProvider {
    async fn transcribe(
        &self,
        frame: &AudioFrame,
        expected_language: LanguageCode,
    ) -> Option<TranscriptionChunk> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(TranscriptionChunk {
            session_id: frame.session_id.clone(),
            text: self.text.clone(),
            is_final: true,
            language: expected_language,
            timestamp_ms: frame.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "stub-stt"
    }
}

/// Passes the transcript through unchanged, tagged with the target language.
/// Declines (`None`) on empty input, matching the real contract's "declined"
/// case.
pub struct StubTranslationProvider;

#[async_trait]
impl TranslationProvider for StubTranslationProvider {
    async fn translate(&self, transcript: &TranscriptionChunk) -> Option<TranslationChunk> {
        if transcript.text.trim().is_empty() {
            return None;
        }
        Some(TranslationChunk {
            session_id: transcript.session_id.clone(),
            text: transcript.text.clone(),
            source_language: transcript.language,
            target_language: transcript.language.other(),
            timestamp_ms: transcript.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "stub-translation"
    }
}

/// Emits a tiny silent PCM payload so downstream egress plumbing can be
/// exercised without a real TTS backend.
pub struct StubTtsProvider;

const SILENT_FRAME_SAMPLES: usize = 320; // 20ms at 16kHz
const SILENT_FRAME_SAMPLE_RATE_HZ: u32 = 16_000;

#[async_trait]
impl TtsProvider for StubTtsProvider {
    async fn synthesize(&self, translation: &TranslationChunk) -> Option<TtsChunk> {
        if translation.text.trim().is_empty() {
            return None;
        }
        Some(TtsChunk {
            session_id: translation.session_id.clone(),
            encoding: AudioEncoding::PcmS16le,
            sample_rate_hz: SILENT_FRAME_SAMPLE_RATE_HZ,
            payload: vec![0u8; SILENT_FRAME_SAMPLES * 2],
            timestamp_ms: translation.timestamp_ms,
        })
    }

    fn name(&self) -> &str {
        "stub-tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> AudioFrame {
        AudioFrame {
            session_id: "s1".to_string(),
            source: telegate_core::IngressSource::SipBridge,
            sample_rate_hz: 8000,
            encoding: AudioEncoding::PcmS16le,
            timestamp_ms: 100,
            payload: vec![0u8; 160],
        }
    }

    #[tokio::test]
    async fn stub_stt_returns_configured_text() {
        let provider = StubSttProvider::new("hola");
        let chunk = provider.transcribe(&frame(), LanguageCode::Es).await.unwrap();
        assert_eq!(chunk.text, "hola");
        assert!(chunk.is_final);
        assert_eq!(chunk.language, LanguageCode::Es);
    }

    #[tokio::test]
    async fn stub_stt_declines_on_empty_text() {
        let provider = StubSttProvider::new("  ");
        assert!(provider.transcribe(&frame(), LanguageCode::Es).await.is_none());
    }

    #[tokio::test]
    async fn stub_translation_flips_language() {
        let transcript = TranscriptionChunk {
            session_id: "s1".to_string(),
            text: "hola".to_string(),
            is_final: true,
            language: LanguageCode::Es,
            timestamp_ms: 100,
        };
        let translation = StubTranslationProvider
            .translate(&transcript)
            .await
            .unwrap();
        assert_eq!(translation.source_language, LanguageCode::Es);
        assert_eq!(translation.target_language, LanguageCode::En);
    }

    #[tokio::test]
    async fn stub_tts_produces_silent_payload() {
        let translation = TranslationChunk {
            session_id: "s1".to_string(),
            text: "hello".to_string(),
            source_language: LanguageCode::Es,
            target_language: LanguageCode::En,
            timestamp_ms: 100,
        };
        let chunk = StubTtsProvider.synthesize(&translation).await.unwrap();
        assert_eq!(chunk.payload.len(), SILENT_FRAME_SAMPLES * 2);
    }
}
