//! Pipeline stages for invoice extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. add a provider family) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ prompt ──▶ chat ──▶ decode ──▶ validate
//! (OCR text)  (static)   (LLM)    (JSON)     (schema)
//! ```
//!
//! 1. [`chat`]   — drive the provider chat call; the only stage with
//!    network I/O. Fail-fast: no retry, timeouts surface as errors.
//! 2. [`decode`] — strip code fences and parse the raw response text into
//!    a JSON object via ordered parser strategies.
//!
//! Prompt construction lives in [`crate::prompts`] and validation in
//! [`crate::schema`]; [`crate::extract`] wires the stages together.

pub mod chat;
pub mod decode;
