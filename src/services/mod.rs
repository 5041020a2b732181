// Services module - Business logic

pub mod codes;
pub mod image_processor;
pub mod marketplace;
pub mod password;
pub mod qr_generator;
pub mod registration;
pub mod rewards;
pub mod token;
pub mod wallet;
