pub mod money;
pub mod ports;
pub mod product;
pub mod transaction;
pub mod user;
pub mod wallet;
