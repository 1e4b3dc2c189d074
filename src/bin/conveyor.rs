//! The belt harness: RT task set plus the stdin command surface.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use conveyor_rt::tasks::{Harness, Shared};
use conveyor_rt::{cmd, rt};

#[derive(Parser)]
#[command(name = "conveyor", about = "RT instrumentation harness for a simulated conveyor belt")]
struct Cli {
    /// Stop automatically after this many seconds (default: run until `q`).
    #[arg(long)]
    duration: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    rt::lock_memory();
    rt::install_signal_handlers();

    let shared = Arc::new(Shared::new());
    let harness = match Harness::spawn(Arc::clone(&shared)) {
        Ok(harness) => harness,
        Err(e) => {
            eprintln!("failed to spawn task set: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("conveyor up; commands: b=sort d=e-stop h=setpoint q=quit");

    if let Some(secs) = cli.duration {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            shared.request_stop();
        });
    }

    cmd::pump(&shared);
    shared.request_stop();
    harness.join();
    log::info!("conveyor down");
    ExitCode::SUCCESS
}
