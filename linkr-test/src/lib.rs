mod app;

pub use app::{resolve_path, to_pointer, TestApp, TestRequest, TestResponse};
