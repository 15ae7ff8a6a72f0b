// Data models - row structs and ALL SQL for the settings domain

pub mod site_settings;

pub use site_settings::{SiteSettings, AVAILABLE_MODELS, DEFAULT_MODEL};
