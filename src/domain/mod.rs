pub mod bowl;
pub mod cart;
pub mod money;
pub mod order;
pub mod payments;
pub mod summary;
