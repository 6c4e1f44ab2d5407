pub mod anthropic;
pub mod api_client;
pub mod base;
pub mod errors;
pub mod factory;
pub mod gemini;
pub mod mistral;
pub mod openai;
pub mod perplexity;

#[cfg(test)]
pub mod mock;
