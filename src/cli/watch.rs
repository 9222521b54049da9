//! Watch command implementation (`sitepack watch`)
//!
//! Starts the dev server and the watch loop side by side on one runtime.
//! The watch loop itself is synchronous, so it runs on a blocking thread
//! while the server and its websocket subscribers share the async side.
//! Neither half terminates on its own; reaching the end of this function
//! means one of them failed.

use std::path::Path;
use std::process::ExitCode;

use tokio::runtime::Runtime;

use super::{run::load_context, EXIT_ERROR};
use crate::config::CliOverrides;
use crate::serve::{serve, ReloadHub};
use crate::tasks::TaskRegistry;

/// Run the watch command
pub fn run_watch(
    config_path: Option<&Path>,
    port: Option<u16>,
    root: Option<&Path>,
    verbose: bool,
) -> ExitCode {
    let overrides = CliOverrides {
        port,
        root: root.map(|p| p.to_path_buf()),
        ..Default::default()
    };
    let ctx = match load_context(config_path, &overrides, verbose) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let registry = TaskRegistry::from_config(&ctx);
    let server_root = ctx.server_root();
    let server_port = ctx.config().server.port;

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create async runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Starting watch mode...");
    println!("Press Ctrl+C to stop");
    println!();

    rt.block_on(async move {
        let hub = ReloadHub::new();

        let server_hub = hub.clone();
        let mut server = tokio::spawn(serve(server_root, server_port, server_hub));

        let watch_hub = hub.clone();
        let mut watcher = tokio::task::spawn_blocking(move || {
            crate::watch::watch(&ctx, &registry, &watch_hub)
        });

        tokio::select! {
            result = &mut server => match result {
                Ok(Err(e)) => eprintln!("Server error: {}", e),
                Ok(Ok(())) => eprintln!("Server stopped unexpectedly"),
                Err(e) => eprintln!("Server task panicked: {}", e),
            },
            result = &mut watcher => match result {
                Ok(Err(e)) => eprintln!("Watch error: {}", e),
                Ok(Ok(())) => eprintln!("Watch loop stopped unexpectedly"),
                Err(e) => eprintln!("Watch task panicked: {}", e),
            },
        }
    });

    // The watch process has no successful exit path of its own
    ExitCode::from(EXIT_ERROR)
}
