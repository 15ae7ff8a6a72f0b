// Data models - row structs and ALL SQL for the posts domain

pub mod post;
pub mod submitter;

pub use post::{CreatePost, EditContent, Post};
pub use submitter::{BlockAction, Submitter};
