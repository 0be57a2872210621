pub mod migrate;
pub mod ping;
pub mod user;
