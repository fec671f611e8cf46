//! # Route Modules
//!
//! Each module builds an Axum router for one API surface area. Routers
//! are merged into the application in `lib.rs`.

pub mod ceremony;
pub mod health;
pub mod proofs;
