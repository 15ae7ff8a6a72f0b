// Pure utility functions with no side effects

pub mod richtext;
pub mod text;
