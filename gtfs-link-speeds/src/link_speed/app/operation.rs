//! operations of the gtfs_link_speeds command line tool.
use crate::link_speed::{batch_ops, config::LinkSpeedConfig, LinkSpeedError};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum LinkSpeedOperation {
    /// compute per-trip link speeds and per-period link summaries
    LinkSpeeds {
        /// a GTFS archive (.zip) or a directory of GTFS .txt files
        #[arg(long)]
        input: String,
        #[arg(long)]
        output_directory: String,
        /// .toml or .json engine settings. defaults apply when omitted.
        #[arg(long)]
        configuration_file: Option<String>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// write the resolved path of each shape with its route, service and direction
    Shapes {
        /// a GTFS archive (.zip) or a directory of GTFS .txt files
        #[arg(long)]
        input: String,
        #[arg(long)]
        output_directory: String,
        /// .toml or .json engine settings. defaults apply when omitted.
        #[arg(long)]
        configuration_file: Option<String>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// write trip counts, headways and vehicle service hours per route
    /// pattern and time-of-day period
    Opdata {
        /// a GTFS archive (.zip) or a directory of GTFS .txt files
        #[arg(long)]
        input: String,
        #[arg(long)]
        output_directory: String,
        /// .toml or .json settings, read for the periods. defaults apply when omitted.
        #[arg(long)]
        configuration_file: Option<String>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// write each stop with the trips and routes serving it
    Stops {
        /// a GTFS archive (.zip) or a directory of GTFS .txt files
        #[arg(long)]
        input: String,
        #[arg(long)]
        output_directory: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
}

impl LinkSpeedOperation {
    pub fn run(&self) -> Result<(), LinkSpeedError> {
        match self {
            LinkSpeedOperation::LinkSpeeds {
                input,
                output_directory,
                configuration_file,
                overwrite,
            } => {
                let config = read_config(configuration_file.as_ref())?;
                let output_path = prepare_output_directory(output_directory)?;
                let report = batch_ops::process_bundle(input, output_path, &config, *overwrite)?;
                log::info!("finished {input}: {report}");
                Ok(())
            }
            LinkSpeedOperation::Shapes {
                input,
                output_directory,
                configuration_file,
                overwrite,
            } => {
                let config = read_config(configuration_file.as_ref())?;
                let output_path = prepare_output_directory(output_directory)?;
                batch_ops::process_shapes(input, output_path, &config, *overwrite)?;
                Ok(())
            }
            LinkSpeedOperation::Opdata {
                input,
                output_directory,
                configuration_file,
                overwrite,
            } => {
                let config = read_config(configuration_file.as_ref())?;
                let output_path = prepare_output_directory(output_directory)?;
                batch_ops::process_operating_data(input, output_path, &config, *overwrite)?;
                Ok(())
            }
            LinkSpeedOperation::Stops {
                input,
                output_directory,
                overwrite,
            } => {
                let output_path = prepare_output_directory(output_directory)?;
                batch_ops::process_stops(input, output_path, *overwrite)?;
                Ok(())
            }
        }
    }
}

fn read_config(configuration_file: Option<&String>) -> Result<LinkSpeedConfig, LinkSpeedError> {
    match configuration_file {
        Some(f) => {
            log::info!("reading configuration from {f}");
            LinkSpeedConfig::try_from(f)
        }
        None => Ok(LinkSpeedConfig::default()),
    }
}

fn prepare_output_directory(output_directory: &str) -> Result<&Path, LinkSpeedError> {
    let path = Path::new(output_directory);
    std::fs::create_dir_all(path).map_err(|e| {
        LinkSpeedError::OutputError(format!("failure creating {output_directory}: {e}"))
    })?;
    Ok(path)
}
