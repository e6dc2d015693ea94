pub mod account;
pub mod accounts_file;
pub mod operation;
pub mod product;
pub mod snapshot;
