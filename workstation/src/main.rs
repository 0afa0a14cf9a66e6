use anyhow::Context;
use app::{Message, Workstation};
use clap::Parser;
use config::WorkstationConfig;
use iced::{time, Subscription, Task, Theme};
use log::info;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::runtime::{Builder as TokioBuilder, Handle};

mod app;
mod config;
mod view;

static CONFIG: OnceLock<WorkstationConfig> = OnceLock::new();

#[derive(Parser)]
#[command(author, version, about = "Chest X-ray triage workstation")]
struct Args {
    /// Load workstation settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = WorkstationConfig::load_or_default(args.config.as_deref())?;
    info!(
        "starting workstation: {} patients in directory, reports to {}",
        config.directory.entries().len(),
        config.report_dir.display()
    );
    let _ = CONFIG.set(config);

    // Dialogue timers run here, independent of the UI executor.
    let runtime = TokioBuilder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("creating dialogue runtime")?;
    let handle = runtime.handle().clone();

    iced::application(move || boot(handle.clone()), Workstation::update, view::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
        .context("running workstation UI")
}

fn config() -> &'static WorkstationConfig {
    CONFIG.get_or_init(WorkstationConfig::default)
}

fn boot(runtime: Handle) -> (Workstation, Task<Message>) {
    (Workstation::new(config(), runtime), Task::none())
}

fn application_title(_: &Workstation) -> String {
    "Pneumonia Triage Workstation".into()
}

fn application_subscription(_: &Workstation) -> Subscription<Message> {
    time::every(config().tick()).map(|_| Message::Tick)
}

fn application_theme(_: &Workstation) -> Theme {
    Theme::Dark
}
