// Domain modules - business logic grouped by aggregate

pub mod audit;
pub mod moderators;
pub mod posts;
pub mod settings;
