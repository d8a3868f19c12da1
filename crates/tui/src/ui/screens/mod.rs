pub mod import;
pub mod login;
pub mod receipts;
pub mod stats;
pub mod transactions;
