// API data types - what handlers serialize, decoupled from row structs

pub mod board;

pub use board::{BoardData, BoardSection, DashboardData, ModPostData, PostData};
