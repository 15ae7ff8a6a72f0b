//! Posts domain - the moderated lifecycle of tips and notices.
//!
//! Layering follows the rest of the codebase:
//! - `machines/` - pure decision logic, no IO
//! - `models/` - row structs and ALL SQL
//! - `data/` - API-facing projections
//! - `ai_assist` - LLM orchestration, always degrading to None
//! - `actions/` - one function per verb, wiring the layers together

pub mod actions;
pub mod ai_assist;
pub mod data;
pub mod machines;
pub mod models;
