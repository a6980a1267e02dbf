pub mod allocation;
pub mod common;
pub mod prize;
pub mod reconcile;

pub use allocation::*;
pub use common::*;
pub use prize::*;
pub use reconcile::*;
