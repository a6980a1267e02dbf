pub mod allocations;
pub mod prizes;

pub use allocations as allocation_entity;
pub use prizes as prize_entity;
