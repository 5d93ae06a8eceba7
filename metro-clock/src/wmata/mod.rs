//! WMATA real-time API client.
//!
//! Covers the five endpoints the dashboard needs: the rail station list,
//! per-station train predictions, bus stop search by location, per-stop bus
//! predictions and system incidents. Every request carries the `api_key`
//! header.
//!
//! Response shapes are loose: fields go missing, minute counts arrive as
//! strings like `"BRD"`, and stop ids are sometimes numbers. The DTOs keep
//! those fields raw and the provider layer normalizes them.

mod client;
mod error;
mod types;

pub use client::{TransitApi, WmataClient, WmataConfig};
pub use error::WmataError;
pub use types::{
    BusPredictionDto, BusPredictionsResponse, BusStopDto, IncidentDto, RailStationDto,
    TrainPredictionDto,
};
