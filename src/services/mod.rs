pub mod allocator;
pub mod catalog_service;
pub mod draw_service;
pub mod eligibility;
pub mod reconcile_service;
pub mod selector;

pub use allocator::*;
pub use catalog_service::*;
pub use draw_service::*;
pub use eligibility::*;
pub use reconcile_service::*;
