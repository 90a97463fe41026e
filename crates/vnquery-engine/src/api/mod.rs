//! Market data provider implementations

pub mod tcbs;

pub use tcbs::TcbsClient;
