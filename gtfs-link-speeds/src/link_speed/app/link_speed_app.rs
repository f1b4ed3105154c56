use super::LinkSpeedOperation;
use crate::link_speed::LinkSpeedError;
use clap::Parser;

/// command line tool computing travel times and speeds on the links between
/// consecutive stops of a GTFS feed
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct LinkSpeedApp {
    #[command(subcommand)]
    pub op: LinkSpeedOperation,
    /// number of threads processing trips
    #[arg(long, default_value_t = 1)]
    pub parallelism: usize,
}

impl LinkSpeedApp {
    pub fn run(&self) -> Result<(), LinkSpeedError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build_global()
            .map_err(|e| {
                LinkSpeedError::ConfigurationError(format!("failure building thread pool: {e}"))
            })?;
        self.op.run()
    }
}
