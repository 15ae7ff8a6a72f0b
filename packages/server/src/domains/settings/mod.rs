//! Settings domain - the site configuration singleton.

pub mod models;

pub use models::{SiteSettings, AVAILABLE_MODELS, DEFAULT_MODEL};
