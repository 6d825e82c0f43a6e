pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod registry_client;
pub mod rpc;
pub mod time;
pub mod token;
pub mod tokio_util;
pub mod txid;

pub use error::{DomainError, HoldKind, TxState};
pub use txid::TxId;
