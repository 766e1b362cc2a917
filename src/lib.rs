pub mod calc;
pub mod client;
pub mod db;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod server;
pub mod store;
pub mod validate;
