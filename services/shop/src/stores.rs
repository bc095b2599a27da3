//! In-memory stores backed by JSON collections
//!
//! Each store owns one collection behind its own lock and writes the whole
//! collection back before a mutation reports success.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartStore;
pub use order::OrderLedger;
pub use product::{ProductStore, StockLine};
pub use user::UserStore;
