//! HTTP服务器模块 - 暴露歌曲生成、状态查询与下载API

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use models::*;
pub use server::*;
pub use state::*;
