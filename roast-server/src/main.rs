use std::net::SocketAddr;
use std::process::exit;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Parser;
use roast::args::Opt;
use roast::config::RoastConfig;
use roast::sampler::{self, Sampler, StopHandle};
use roast::snapshot::{ProcSource, ScriptedSource, SnapshotSource};
use roast::{CallTree, Symbols};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::state::AppState;

pub mod error;
pub mod routes;
pub mod state;

fn setup_logger(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_symbols(config: &RoastConfig) -> Symbols {
    let Some(dir) = &config.mappings.dir else {
        return Symbols::new();
    };
    match Symbols::load(dir) {
        Ok(symbols) => symbols,
        Err(e) => {
            error!("failed to read the mappings (joined.srg, methods.csv) from {:?}: {}", dir, e);
            exit(2);
        }
    }
}

fn open_source(opt: &Opt) -> Box<dyn SnapshotSource> {
    let source: Result<Box<dyn SnapshotSource>, _> = match (&opt.replay, opt.pid) {
        (Some(path), _) => ScriptedSource::from_path(path).map(|s| {
            info!("replaying {} snapshots from {:?}", s.remaining(), path);
            Box::new(s) as Box<dyn SnapshotSource>
        }),
        (None, Some(pid)) => ProcSource::attach(pid).map(|s| {
            info!("attached to pid {}", s.pid());
            Box::new(s) as Box<dyn SnapshotSource>
        }),
        (None, None) => unreachable!("clap requires --pid or --replay"),
    };
    match source {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            exit(3);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    setup_logger(opt.log_level);

    let config = RoastConfig::new(&opt)?;
    let symbols = Arc::new(load_symbols(&config));
    let source = open_source(&opt);

    let calltree = CallTree::shared();
    let sampler = Sampler::new(source, Arc::clone(&calltree), config.sampler_config(SystemTime::now()))?;
    if let Some(timeout) = config.sampling.timeout_secs.filter(|t| *t > 0) {
        info!("sampling set to stop in {} seconds", timeout);
    }
    if let Some(thread) = &config.sampling.thread {
        info!("only recording thread {:?}", thread);
    }

    let state = AppState::new(Arc::clone(&calltree), symbols, sampler.status());
    let (stop, stop_rx) = StopHandle::channel();
    let (done_tx, mut done_rx) = watch::channel(false);
    let sampling = tokio::spawn(async move {
        let res = sampler::run(sampler, stop_rx).await;
        done_tx.send_replace(true);
        res
    });

    let addr: SocketAddr = config
        .address()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.address()))?;
    info!("serving on http://{}", addr);

    let exit_on_stop = opt.exit_on_stop;
    let sampling_done = async move {
        while !*done_rx.borrow() {
            if done_rx.changed().await.is_err() {
                break;
            }
        }
    };
    let shutdown = async move {
        tokio::select! {
            _ = signal::ctrl_c() => info!("exiting"),
            _ = sampling_done, if exit_on_stop => info!("sampling finished, exiting"),
        }
    };

    axum::Server::try_bind(&addr)
        .with_context(|| format!("unable to bind {addr}"))?
        .serve(routes::routes(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    stop.stop();
    let sampler = sampling.await??;
    let report = sampler.status().report();
    info!("{} ticks, {} skipped", report.ticks, report.skipped);

    if opt.dump {
        print!("{}", calltree.read());
    }

    Ok(())
}
