pub mod ai;
pub mod database;
pub mod dispatch;
pub mod introspect;

pub use ai::{AiService, GenerationContext};
pub use dispatch::QueryDispatcher;
pub use introspect::SchemaService;
