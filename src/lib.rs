// Public API for the server binary, integration tests and client embedders

pub mod api;
pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod scoring;
pub mod state;
pub mod types;
pub mod ws;
