pub mod http;

pub use http::HttpMirror;
