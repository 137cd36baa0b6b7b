//! Business-rule layer: every surrounding page consumes these modules.

pub mod billing;
pub mod catalog;
pub mod clients;
pub mod ledger;
pub mod managers;
pub mod worklogs;
