pub mod client;
pub mod error;
pub mod server;
pub mod types;

pub use error::{RpcError, RpcResponseError};
pub use types::*;

pub const JSON_RPC_VERSION: &str = "2.0";
