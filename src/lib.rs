pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod state;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
