pub mod api;
pub mod app;
pub mod auth;
pub mod common;
pub mod config;
pub mod database;
pub mod entity;
pub mod geo;
pub mod id;
pub mod logger;
pub mod params;
pub mod serde;
pub mod server;
pub mod service;
pub mod sms;
pub mod upload;
