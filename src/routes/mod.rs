pub mod business;
pub mod ping;
pub mod search;
