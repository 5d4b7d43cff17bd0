//! # Route Modules
//!
//! - `images` — the wildcard image route. Every path that is not a probe or
//!   `/metrics` is an image request.

pub mod images;
