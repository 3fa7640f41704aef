pub mod commands;
pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod navigation;
pub mod outbound;
pub mod render;

pub type HandlerResult = anyhow::Result<()>;

pub use commands::Keyword;
pub use context::AppContext;
pub use handlers::build_schema;
