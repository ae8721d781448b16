pub mod connection;
pub mod query;
pub mod schema;
pub mod settings;

pub use connection::*;
pub use query::*;
pub use schema::*;
pub use settings::*;
