//! Command line entry point for news discovery
//!
//! Starts or follows discovery runs against the dashboard backend and
//! prints their progress until they settle.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::signal;

use discovery::{
    services::{CombinedStatusSource, RealDiscoveryApi, RemoteStatusSource},
    DiscoveryApi, DiscoveryLifecycle, DiscoveryResult, DiscoveryRun,
    LifecycleSettings, StartConfig, Stage, StatusSource,
};
use shared::{logging, DiscoveryScope, LlmProvider};

/// Start and follow LLM-driven news discovery runs
#[derive(Parser)]
#[command(name = "discovery")]
#[command(about = "Starts news discovery runs on the dashboard backend and follows their progress")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(flatten)]
    pub timing: TimingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs)]
pub struct TimingArgs {
    /// Delay between status requests
    #[arg(long, default_value = "3000", global = true)]
    pub poll_interval_ms: u64,

    /// Give up polling after this many seconds, 0 polls until the run settles
    #[arg(long, default_value = "60", global = true)]
    pub ceiling_secs: u64,

    /// Pause between per-resource requests of a sweep
    #[arg(long, default_value = "1000", global = true)]
    pub item_delay_ms: u64,
}

impl TimingArgs {
    fn settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            polling_ceiling: (self.ceiling_secs > 0).then(|| Duration::from_secs(self.ceiling_secs)),
            item_delay: Duration::from_millis(self.item_delay_ms),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the previous run and the period the next one covers
    Info {
        #[arg(long, default_value = "resources")]
        scope: DiscoveryScope,
    },
    /// List LLM providers known to the backend
    Providers,
    /// Start a backend discovery job and follow it
    Start {
        #[arg(long, default_value = "resources")]
        scope: DiscoveryScope,
        #[arg(long, default_value = "auto")]
        provider: LlmProvider,
        /// Search configuration, required for resource discovery
        #[arg(long)]
        config_id: Option<u64>,
        /// Restrict resource discovery to a section, repeatable
        #[arg(long = "section")]
        sections: Vec<String>,
        /// Search from this date (YYYY-MM-DD) instead of the last run
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Request discovery resource by resource from this client
    Sweep {
        #[arg(long, default_value = "auto")]
        provider: LlmProvider,
    },
    /// Follow resource and manufacturer jobs that are already running
    Watch,
}

#[tokio::main]
async fn main() -> DiscoveryResult<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let settings = args.timing.settings();
    settings.validate()?;

    let api = match RealDiscoveryApi::from_env() {
        Ok(api) => Arc::new(api),
        Err(e) => {
            logging::log_error("Loading API configuration", &e);
            return Err(e);
        }
    };

    let outcome = match args.command {
        Command::Info { scope } => show_info(api, scope, settings).await,
        Command::Providers => show_providers(api).await,
        Command::Start { scope, provider, config_id, sections, since } => {
            let config = StartConfig {
                search_config_id: config_id,
                sections,
                last_search_date: since,
            };
            logging::log_startup(&format!("{scope} discovery"));
            let lifecycle = DiscoveryLifecycle::polling(api, scope, settings);
            lifecycle.start(provider, config).await?;
            follow(&lifecycle).await
        }
        Command::Sweep { provider } => {
            let targets = api.list_resources().await?;
            logging::log_startup(&format!("sequential discovery over {} resources", targets.len()));
            let lifecycle = DiscoveryLifecycle::sequential(api, targets, settings);
            lifecycle.start(provider, StartConfig::default()).await?;
            follow(&lifecycle).await
        }
        Command::Watch => {
            let sources: Vec<Arc<dyn StatusSource>> = vec![
                Arc::new(RemoteStatusSource::new(Arc::clone(&api), DiscoveryScope::Resources)),
                Arc::new(RemoteStatusSource::new(Arc::clone(&api), DiscoveryScope::Manufacturers)),
            ];
            logging::log_startup("watching resource and manufacturer discovery");
            let lifecycle = DiscoveryLifecycle::polling(api, DiscoveryScope::Resources, settings)
                .with_status_source(Arc::new(CombinedStatusSource::new(sources)));
            lifecycle.attach().await?;
            follow(&lifecycle).await
        }
    };

    match outcome {
        Ok(Some(run)) if run.stage == Stage::Failed => {
            logging::log_shutdown("discovery run failed");
            std::process::exit(1);
        }
        Ok(_) => {
            logging::log_shutdown("done");
            Ok(())
        }
        Err(e) => {
            logging::log_error("Discovery command", &e);
            Err(e)
        }
    }
}

async fn show_info(
    api: Arc<RealDiscoveryApi>,
    scope: DiscoveryScope,
    settings: LifecycleSettings,
) -> DiscoveryResult<Option<DiscoveryRun>> {
    let lifecycle = DiscoveryLifecycle::polling(api, scope, settings);
    let info = lifecycle.load_info().await;
    println!("Scope:          {scope}");
    println!("Last discovery: {}", info.last_discovery_date.as_deref().unwrap_or("never"));
    println!("Period start:   {}", info.period_start.as_deref().unwrap_or("-"));
    println!("Period end:     {}", info.period_end.as_deref().unwrap_or("-"));
    if let Some(total) = info.total_targets {
        println!("Targets:        {total}");
    }
    Ok(None)
}

async fn show_providers(api: Arc<RealDiscoveryApi>) -> DiscoveryResult<Option<DiscoveryRun>> {
    let response = api.list_providers().await?;
    for provider in &response.providers {
        let marker = if provider.id == response.default { "*" } else { " " };
        let availability = if provider.available { "available" } else { "unavailable" };
        println!("{marker} {:<10} {:<12} {}", provider.id, availability, provider.name);
    }
    Ok(None)
}

/// Print snapshots until the run settles or the user interrupts
async fn follow(lifecycle: &DiscoveryLifecycle<RealDiscoveryApi>) -> DiscoveryResult<Option<DiscoveryRun>> {
    let mut updates = lifecycle.subscribe();
    let mut current = updates.borrow_and_update().clone();
    println!("Following {} discovery run {}", lifecycle.scope(), current.id);
    print_run(&current);

    while current.stage == Stage::Running {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                current = updates.borrow_and_update().clone();
                print_run(&current);
            }
            _ = signal::ctrl_c() => {
                lifecycle.cancel();
                tracing::warn!("Interrupted; the backend job keeps running");
                return Ok(Some(current));
            }
        }
    }

    let run = lifecycle.wait().await?;
    if run.stage == Stage::Done {
        let drafts = lifecycle.new_drafts().await?;
        println!("New drafts: {}", drafts.new_count);
        for draft in &drafts.new_items {
            println!("  #{} {}", draft.id, draft.title);
        }
    }
    Ok(Some(run))
}

fn print_run(run: &DiscoveryRun) {
    let mut line = format!(
        "[{}] {}/{} ({}%)",
        run.stage, run.progress.processed, run.progress.total, run.percent()
    );
    if let Some(item) = &run.current_item {
        line.push_str(&format!(" {item}"));
    }
    if let Some(outcome) = &run.outcome {
        line.push_str(&format!(
            " created {}, errors {}, processed {}",
            outcome.created, outcome.errors, outcome.total_processed
        ));
    }
    if let Some(message) = &run.error_message {
        line.push_str(&format!(" {message}"));
    }
    println!("{line}");
}
