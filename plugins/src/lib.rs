pub mod factory;
pub mod mirror;
pub mod provider;
pub mod services;
