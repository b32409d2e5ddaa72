//! REST backend for a text RPG: accounts, classes, items, characters,
//! equipment and a shop.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod game;
pub mod http;
pub mod metrics;
