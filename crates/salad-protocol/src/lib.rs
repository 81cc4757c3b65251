//! Saleae Logic 2 Automation Wire Types
//!
//! Defines the JSON RPC envelope spoken by the mock server, the typed
//! request/reply messages for every automation method, and the status-code
//! vocabulary shared by handlers and scenario fault rules.

pub mod envelope;
pub mod messages;
pub mod method;
pub mod status;

pub use envelope::{RpcRequest, RpcResponse};
pub use method::Method;
pub use status::{RpcStatus, StatusCode};
