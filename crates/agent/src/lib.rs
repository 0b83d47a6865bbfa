//! Sales pipeline - retrieval-augmented response generation
//!
//! This crate is the "brain" of the brewbot system - the pipeline that turns
//! one inbound customer message into one delivered reply:
//! - **Embedding** (`embedder`) - free text → fixed-dimension query vector
//! - **Retrieval** (`retriever` / `index`) - top-K similarity search normalized
//!   into typed catalog items
//! - **Composition** (`prompt`) - grounding text + versioned instruction
//!   template
//! - **Generation** (`generator`) - bounded chat completion with a fixed
//!   promotional fallback
//! - **Tracing** (`tracer`) - per-turn execution trace, fire-and-forget
//! - **Orchestration** (`runtime`) - the turn state machine
//!
//! # Degradation Principle
//!
//! Every stage completes with a usable value. Dependency failures are
//! contained at the stage boundary and converted into that stage's documented
//! fallback (synthetic vector, demo catalog, fixed reply, no-op trace,
//! dropped send). A turn that starts always reaches the delivery stage.

pub mod embedder;
pub mod generator;
pub mod index;
pub mod prompt;
pub mod retriever;
pub mod runtime;
pub mod tracer;
