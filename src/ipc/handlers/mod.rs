pub mod core;
pub mod export;
pub mod form;
pub mod report;
pub mod setup;
