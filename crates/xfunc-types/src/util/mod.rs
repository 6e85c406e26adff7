//! Helper types shared across the workspace.

pub mod money_amount;

pub use money_amount::{MoneyAmount, MoneyAmountParseError};
