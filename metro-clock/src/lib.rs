//! Metro clock server.
//!
//! A wall dashboard for one home location: next trains and buses, nearby
//! bikeshare docks, the weather and service incidents, gathered from public
//! APIs and served as a single JSON summary.

pub mod cache;
pub mod config;
pub mod gbfs;
pub mod geo;
pub mod json;
pub mod providers;
pub mod summary;
pub mod weather;
pub mod web;
pub mod wmata;
