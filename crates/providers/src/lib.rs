//! STT, translation and TTS provider implementations. `stub` requires no
//! credentials and is the startup default; `http` is selected when an
//! endpoint URL is configured for that capability.

mod error;
mod http;
mod stub;
mod traits;

pub use error::ProviderError;
pub use http::{HttpSttProvider, HttpTranslationProvider, HttpTtsProvider};
pub use stub::{StubSttProvider, StubTranslationProvider, StubTtsProvider};
pub use traits::{StreamingSttProvider, TranslationProvider, TtsProvider};
