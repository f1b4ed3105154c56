use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Enumerates alternative ways to handle
/// missing lon,lat data for a stop (and its parent station)
#[derive(Serialize, Deserialize, Debug, ValueEnum, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStopLocationPolicy {
    /// exclude the whole trip
    Fail,
    /// drop the visit from the trip and keep going
    #[default]
    DropStop,
}
