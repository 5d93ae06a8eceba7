//! General Bikeshare Feed Specification (GBFS) client.
//!
//! A GBFS system publishes a discovery document listing its sub-feeds per
//! language. We only read two of them: `station_information` (names and
//! coordinates, effectively static) and `station_status` (live counts).

mod client;
mod error;
mod types;

pub use client::{BikeshareApi, GbfsClient, GbfsConfig};
pub use error::GbfsError;
pub use types::{DiscoveryResponse, StationInformationDto, StationStatusDto, VehicleTypeCount};
