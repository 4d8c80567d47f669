pub mod cli;
pub mod diff;
pub mod error;
pub mod github;
pub mod ingest;
pub mod model;
pub mod module;
pub mod parsers;
pub mod report;
