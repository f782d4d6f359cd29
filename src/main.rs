use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vaultwatch::{
    Caller, Cli, FindingStore, JsonReporter, LogEmitter, MemoryVaultStore, MonitorService,
    OutputFormat, ProfileId, ReplayEvidenceSource, Reporter, ScanRunner, TerminalReporter,
    WatchError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(cli: &Cli) {
    // JSON output has to stay machine-readable, so logs are held to errors
    // in that mode.
    let default = if matches!(cli.format, OutputFormat::Json) {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> vaultwatch::Result<ExitCode> {
    let config = cli.engine_config()?;
    let strict = config.strict;

    let vault = Arc::new(MemoryVaultStore::load(&cli.vault)?);
    let evidence = Arc::new(ReplayEvidenceSource::load(&cli.evidence)?);
    let store = Arc::new(FindingStore::new(Arc::new(LogEmitter)));
    let runner = Arc::new(ScanRunner::new(vault, evidence, store.clone(), config));
    let service = MonitorService::new(runner, store);

    let caller = Caller::system("vaultwatch-cli");
    let profile = ProfileId::new(cli.profile.as_str());
    let report = service.run_scan(&caller, &profile).await?;

    let reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Terminal => Box::new(TerminalReporter::new(cli.verbose)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };
    let rendered = reporter.report(&report);

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(|e| WatchError::SnapshotWrite {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        None => print!("{rendered}"),
    }

    let failed = if strict {
        !report.findings.is_empty()
    } else {
        report.has_alerting_findings()
    };
    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
