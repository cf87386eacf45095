pub mod catalog;
pub mod error;
pub mod locate_station;
pub mod statistics;
