//! taxrag-core
//!
//! Domain types, collaborator traits and configuration shared by the
//! retrieval engine and its storage/embedding backends.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
