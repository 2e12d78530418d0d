pub mod account_service;
pub mod failure_cache;
pub mod password;
pub mod portfolio_service;
pub mod price_service;
pub mod trading_service;
