//! Aperiodic-server demo: a periodic server draining bursts of synthetic
//! jobs submitted by producer threads.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use conveyor_rt::server::{AperiodicServer, ServerParams};
use conveyor_rt::{clock, rt};

#[derive(Parser)]
#[command(name = "aperiodic-server", about = "Periodic server for aperiodic jobs")]
struct Cli {
    /// Server period Ts, milliseconds.
    ts_ms: u64,
    /// Server budget Cs, milliseconds; must not exceed the period.
    cs_ms: u64,
    /// SCHED_FIFO priority for the server task.
    #[arg(default_value_t = 60)]
    priority: i32,
    /// Run time, seconds.
    #[arg(default_value_t = 10)]
    duration_s: u64,
}

// Demo workload: bursts of spin jobs arriving every quarter second.
const BURST_JOBS: usize = 4;
const BURST_GAP: Duration = Duration::from_millis(250);
const JOB_SPIN_US: i64 = 1_000;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let params = match ServerParams::from_millis(cli.ts_ms, cli.cs_ms, cli.priority) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("invalid server parameters: {e}");
            return ExitCode::FAILURE;
        }
    };

    rt::lock_memory();
    rt::install_signal_handlers();

    let server = AperiodicServer::new(params);
    let worker = {
        let server = Arc::clone(&server);
        thread::spawn(move || server.run())
    };

    let producer = {
        let server = Arc::clone(&server);
        thread::spawn(move || {
            while server.running() {
                for _ in 0..BURST_JOBS {
                    server.submit(Box::new(|| clock::spin_for(JOB_SPIN_US)));
                }
                thread::sleep(BURST_GAP);
            }
        })
    };

    log::info!(
        "server up: Ts={} ms Cs={} ms prio={} for {} s",
        cli.ts_ms,
        cli.cs_ms,
        cli.priority,
        cli.duration_s
    );

    for _ in 0..cli.duration_s {
        thread::sleep(Duration::from_secs(1));
        if rt::signaled() {
            log::info!("termination signal received");
            break;
        }
        let s = server.stats();
        println!(
            "SRV: jobs={} drop={} Rmean={}us Rmax={}us periods={} idle={} Bmax={}us",
            s.jobs_executed,
            s.jobs_dropped,
            s.mean_response(),
            s.max_response,
            s.periods_executed,
            s.periods_idle,
            s.max_budget_used,
        );
    }

    server.shutdown();
    let _ = producer.join();
    let _ = worker.join();

    let s = server.stats();
    println!(
        "TOTAL: jobs={} drop={} Rmean={}us Rmax={}us periods={} idle={} Bused={}us Bmax={}us",
        s.jobs_executed,
        s.jobs_dropped,
        s.mean_response(),
        s.max_response,
        s.periods_executed,
        s.periods_idle,
        s.total_budget_used,
        s.max_budget_used,
    );
    ExitCode::SUCCESS
}
