pub mod config;
pub mod db;
pub mod error;
pub mod similarity;
pub mod store;
