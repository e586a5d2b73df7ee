pub mod account;
pub mod excuse;
pub mod ledger;
pub mod person;
pub mod state;
