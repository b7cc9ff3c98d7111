#![deny(unused_imports)]
#![deny(unused_variables)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod ranking;
pub mod traits;
pub mod types;
