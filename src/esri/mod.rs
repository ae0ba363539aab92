pub mod conversion;
pub mod debounce;
pub mod query;
