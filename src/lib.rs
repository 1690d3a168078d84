pub mod controllers;
pub mod core;
pub mod db;
pub mod models;
pub mod registry_web_server;
pub mod routes;
