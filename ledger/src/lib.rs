pub mod error;
pub mod models;
pub mod store;

pub use error::LedgerError;
pub use models::{Account, Market, Order, OrderStatus, Position, Side, TokenType, Trade};
pub use store::{Ledger, LedgerTxn};
