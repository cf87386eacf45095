pub mod proximity;
pub mod query;
pub mod station;
