pub mod trade;
pub mod user;

pub use trade::*;
pub use user::*;
