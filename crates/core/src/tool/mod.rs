//! Tool executor access: the raw proxy and the typed handlers built on it

mod gateway;
pub mod handlers;

pub use gateway::{
    ToolCall, ToolGateway, ToolGatewayConfig, ToolResponse, DEFAULT_TOOL_TIMEOUT, TOKEN_HEADER,
};
pub use handlers::{ToolHandler, ToolHandlers};
