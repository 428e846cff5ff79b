mod market;
mod order;
mod position;
mod trade;

pub use market::{Market, TokenType};
pub use order::{Order, OrderStatus, Side};
pub use position::{Account, Position};
pub use trade::Trade;
