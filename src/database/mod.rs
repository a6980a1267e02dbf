pub mod connection;
pub mod store;

pub use connection::*;
pub use store::DatabaseStore;
