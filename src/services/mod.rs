pub mod cart_service;
pub mod credit_service;
pub mod menu_service;
pub mod order_service;
