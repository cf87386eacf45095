pub mod distance;
pub mod error;
pub mod search;
