pub mod bitfinex;
pub mod messages;
pub mod traits;
