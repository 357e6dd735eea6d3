use std::sync::Arc;

use anyhow::Context;
use badcapt_core::capture::LiveCapture;
use badcapt_core::{CaptureStats, Pipeline, Sniffer};
use tracing::{error, info, warn};

use crate::commands::CommandLine;
use crate::terminal::print;

pub async fn listen(commands: &CommandLine) -> anyhow::Result<()> {
    if !is_root::is_root() {
        warn!("Not running as root, opening {} will probably fail", commands.iface);
    }

    print::header("configuration");
    print::aligned_line("Interface", &commands.iface);
    if commands.debug {
        print::aligned_line("Output", "stdout");
    } else {
        print::aligned_line("Elasticsearch", &commands.elastic);
        print::aligned_line("Index", format!("{}/{}", commands.index, commands.doc_type));
    }
    if let Some(secs) = commands.suppress_window_secs {
        print::aligned_line("Suppression", format!("{secs}s, {} keys", commands.suppress_capacity));
    }

    let pipeline: Pipeline = Pipeline::build(commands.build_options())
        .await
        .context("building the export pipeline")?;
    info!("Markers: {}", pipeline.registry().names().join(", "));

    let source: LiveCapture = LiveCapture::open(&commands.iface, &commands.capture_options())
        .with_context(|| format!("opening capture on {}", commands.iface))?;

    print::header("capturing");
    let sniffer: Sniffer = Sniffer::new(Arc::new(pipeline));
    let stats: CaptureStats = sniffer
        .run(source, shutdown_signal())
        .await
        .context("running the capture loop")?;

    report(&stats);
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => {
            error!("Cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await
        }
    }
}

fn report(stats: &CaptureStats) {
    print::header("summary");
    print::aligned_line("Received", stats.received);
    print::aligned_line("Dropped", stats.dropped);
    print::aligned_line("Read errors", stats.read_errors);
    print::aligned_line("Exported", stats.exported);
    print::aligned_line("Suppressed", stats.suppressed);
    print::aligned_line("Unclassifiable", stats.unclassifiable);
    print::aligned_line("Failed", stats.failed);
    print::end_of_program();
}
