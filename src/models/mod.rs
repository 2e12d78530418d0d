mod holding;
mod money;
mod portfolio;
mod quote;
mod transaction;
mod user;

pub use holding::Holding;
pub use money::Usd;
pub use portfolio::{Portfolio, PortfolioLine};
pub use quote::{Quote, QuoteForm};
pub use transaction::{HistoryEntry, Side, TradeForm, TradeReceipt};
pub use user::{LoginForm, RegisterForm, User, STARTING_CASH};
