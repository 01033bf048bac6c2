pub mod db;
pub mod lifecycle;
pub mod reports;
pub mod server;
pub mod services;
pub mod version;
pub mod web;
