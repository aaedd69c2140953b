pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod models;
pub mod reservation;
pub mod schema;
pub mod store;
