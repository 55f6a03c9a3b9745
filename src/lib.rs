pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod stats;
pub mod store;
pub mod utils;

pub mod schema {
    pub mod api;
    pub mod filters;
}

pub mod api {
    pub mod client;
    pub mod gateway;
}
