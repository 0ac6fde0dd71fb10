mod admin;
mod checkout;
mod product;
mod shipping;
mod translation;
mod visibility;

pub use admin::*;
pub use checkout::*;
pub use product::*;
pub use shipping::*;
pub use translation::*;
pub use visibility::*;
