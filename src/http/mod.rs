pub mod auth;
pub mod characters;
pub mod classes;
pub mod health;
pub mod inventory;
pub mod items;
pub mod routes;
pub mod shop;
