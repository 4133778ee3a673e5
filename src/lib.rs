pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod orchestration;
pub mod prices;

pub use config::Config;
pub use domain::{Address, LpPosition, Pool, PositionHistory, TimeMs, Token};
pub use engine::BaselineMode;
pub use error::AppError;
pub use ledger::{LedgerClient, LedgerError};
pub use orchestration::Analyzer;
pub use prices::{PriceError, PriceFeed};
