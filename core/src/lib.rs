pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod provider;
pub mod store;
pub mod task;
