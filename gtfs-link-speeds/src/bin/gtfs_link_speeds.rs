//! computes travel time and speed on the links between consecutive stops of
//! every trip in a GTFS feed, and summarizes link speeds by time of day.
use clap::Parser;
use gtfs_link_speeds::link_speed::app::LinkSpeedApp;

fn main() {
    env_logger::init();
    let args = LinkSpeedApp::parse();
    if let Err(e) = args.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
