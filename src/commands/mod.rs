pub mod backup;
pub mod import;
pub mod reports;
pub mod sales;
