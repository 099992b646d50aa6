//! Remote translation service integration.

pub mod client;

pub use client::{
    resolve_audio_url, ApiTranslator, SpeechTranslation, SpeechTranslator, TranslateError,
};
