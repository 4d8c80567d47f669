pub mod gocover;

pub use gocover::parse;
