pub mod driver;
pub mod error;
pub mod field_mapper;
pub mod ledger;
pub mod normalizer;
pub mod report;
pub mod synthesizer;
