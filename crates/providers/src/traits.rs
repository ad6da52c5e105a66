//! The three narrow provider capabilities the Orchestrator depends on.
//!
//! Each is polymorphic over its concrete implementation — the Orchestrator
//! holds a `Box<dyn _>` and never branches on which provider is in use.
//! Provider selection (stub vs. HTTP-backed) happens once at startup from
//! `telegate_config::Settings`, never as a runtime capability probe.

use async_trait::async_trait;

use telegate_core::{AudioFrame, LanguageCode, TranscriptionChunk, TranslationChunk, TtsChunk};

/// Speech-to-text. `None` means "no transcript for this frame" — silence, or
/// partial audio below the provider's own threshold.
///
/// `expected_language` is the session's configured source language; frames
/// themselves carry no language tag, so the Orchestrator threads it through.
#[async_trait]
pub trait StreamingSttProvider: Send + Sync {
    async fn transcribe(
        &self,
        frame: &AudioFrame,
        expected_language: LanguageCode,
    ) -> Option<TranscriptionChunk>;

    /// Identifies the concrete backend in logs and metrics.
    fn name(&self) -> &str;
}

/// Translation. `Ok(None)` means the translator declined: empty input,
/// rate-limited, or a failure surfaced as a skip rather than a panic.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, transcript: &TranscriptionChunk) -> Option<TranslationChunk>;

    fn name(&self) -> &str;
}

/// Text-to-speech.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    async fn synthesize(&self, translation: &TranslationChunk) -> Option<TtsChunk>;

    fn name(&self) -> &str;
}
