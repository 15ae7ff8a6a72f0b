// Neighborhood Board - Server Core
//
// This crate provides the backend for a moderated community bulletin board:
// anonymous tip submission, optional LLM pre-screening, and a moderation
// queue with undo and AI-assisted rewrites.
//
// Domains are layered as machines (pure logic), models (rows and SQL),
// data (API projections) and actions (orchestration).

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
