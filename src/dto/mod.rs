pub mod cart;
pub mod credits;
pub mod menu;
pub mod orders;
