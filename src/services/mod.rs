pub mod llm_service;
pub mod result_parser;

pub use llm_service::{InferenceClient, LlmService, ANALYSIS_PROMPT};
pub use result_parser::parse_analysis;
