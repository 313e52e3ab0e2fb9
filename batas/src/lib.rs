//! batas — legal question-answering gateway over an external knowledge base.
//!
//! The pipeline: a raw question goes through the skip classifier (cheap
//! conversational turns never hit the upstream), the query structurer
//! (LLM-backed with a heuristic fallback), the hybrid retriever (vector,
//! lexical and fast-path citation search with caching and retries), and the
//! confidence gate, which decides between a KB-grounded answer and a hedged
//! low-confidence response that still surfaces the evidence.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod kb;
pub mod llm;
pub mod models;
pub mod retrieval;
pub mod scoring;
pub mod services;
pub mod sqg;
