pub mod account;
pub mod history;
pub mod money;
