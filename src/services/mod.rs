pub mod ai_config;
pub mod ai_error;
pub mod ai_providers;
pub mod ai_service;
pub mod language;
pub mod prompt_builder;
pub mod rate_limiter;
pub mod response_normalizer;
