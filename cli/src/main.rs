//! The `spyglass` command line.
//!
//! Serves the inspector protocol over stdin/stdout, framed with
//! `Content-Length` headers. Log messages go to stderr.
//!
//! Set `SPYGLASS_DEBUG=1` to force debug logging regardless of `--log-level`.

mod demo;

use clap::Parser;
use color_eyre::Result;
use log::{LevelFilter, info};
use simple_logger::SimpleLogger;
use spyglass_inspector::{
    InjectedScriptManager,
    protocol::{InspectorServer, StdioTransport},
};
use spyglass_runtime::Runtime;
use std::env;

/// Remote object inspector for the Spyglass reference runtime.
#[derive(Debug, Parser)]
#[command(author, version, about, name = "spyglass")]
struct Opt {
    /// Maximum level of log messages written to stderr.
    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,

    /// Number of isolated contexts to attach.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    context_count: u32,

    /// Start with empty contexts instead of the demo program.
    #[arg(long)]
    no_demo: bool,
}

fn debug_forced() -> bool {
    env::var("SPYGLASS_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Opt::parse();

    let level = if debug_forced() {
        LevelFilter::Debug
    } else {
        args.log_level
    };
    SimpleLogger::new().with_level(level).init()?;

    let mut manager = InjectedScriptManager::new();
    let mut paused = Vec::new();
    for _ in 0..args.context_count {
        let runtime = Runtime::new();
        let top = (!args.no_demo).then(|| demo::populate(&runtime));
        let id = manager.create(runtime);
        if let Some(top) = top {
            paused.push((id, top));
        }
    }

    let mut server = InspectorServer::new(manager);
    for (id, top) in paused {
        server.pause(id, top);
    }

    info!("serving {} context(s) on stdio", args.context_count);
    server.run(&mut StdioTransport::stdio())?;
    info!("client disconnected");
    Ok(())
}
