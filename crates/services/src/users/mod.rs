//! Users service: registration, lookup and the RPC server.

mod server;
mod service;

pub use server::UserRpcServer;
pub use service::{CreateUserInput, UserService};
