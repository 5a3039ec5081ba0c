use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    controller::ControllerEvent,
    detail::{load_apply_detail, load_design_detail, ApplyDetail},
    filter::{ApplyFilter, DateRange, DesignFilter, FilteredList},
    format::format_date_range,
    load_settings, ActionController, ControlAction, LayoutClient, Settings, StaticPermission,
    SubmitOutcome,
};
use shared::domain::{
    ApplyId, ApplyStatus, DesignId, DesignStatus, PolicyCategory, PolicyDraft, PolicyId,
    RollbackStatus,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "layoutctl", about = "Inspect and control layout designs and applies")]
struct Cli {
    /// Settings file; defaults to ./layoutctl.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Designs(DesignCommand),
    #[command(subcommand)]
    Applies(ApplyCommand),
    #[command(subcommand)]
    Policies(PolicyCommand),
}

#[derive(Subcommand, Debug)]
enum DesignCommand {
    List(DesignListArgs),
    Show { id: String },
}

#[derive(Subcommand, Debug)]
enum ApplyCommand {
    List(ApplyListArgs),
    Show { id: String },
    Cancel(ControlArgs),
    Rollback(ControlArgs),
    Terminate(ControlArgs),
    Resume(ControlArgs),
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    List {
        #[arg(long, value_parser = PolicyCategory::parse)]
        category: Option<PolicyCategory>,
    },
    Show {
        id: String,
    },
    Create {
        file: PathBuf,
    },
    Update {
        id: String,
        file: PathBuf,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ControlArgs {
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug, Default)]
struct DateArgs {
    #[arg(long)]
    started_from: Option<String>,
    #[arg(long)]
    started_to: Option<String>,
    #[arg(long)]
    ended_from: Option<String>,
    #[arg(long)]
    ended_to: Option<String>,
}

impl DateArgs {
    fn ranges(&self) -> Result<(DateRange, DateRange)> {
        let started = DateRange::parse(self.started_from.as_deref(), self.started_to.as_deref())
            .map_err(anyhow::Error::msg)
            .context("invalid started range")?;
        let ended = DateRange::parse(self.ended_from.as_deref(), self.ended_to.as_deref())
            .map_err(anyhow::Error::msg)
            .context("invalid ended range")?;
        Ok((started, ended))
    }
}

#[derive(Args, Debug)]
struct DesignListArgs {
    #[arg(long, default_value = "")]
    id: String,
    #[arg(long = "status", value_parser = DesignStatus::parse)]
    status: Vec<DesignStatus>,
    #[command(flatten)]
    dates: DateArgs,
}

#[derive(Args, Debug)]
struct ApplyListArgs {
    #[arg(long, default_value = "")]
    id: String,
    #[arg(long = "status", value_parser = ApplyStatus::parse)]
    status: Vec<ApplyStatus>,
    #[arg(long = "rollback-status", value_parser = RollbackStatus::parse)]
    rollback_status: Vec<RollbackStatus>,
    #[command(flatten)]
    dates: DateArgs,
}

impl DesignListArgs {
    fn filter(&self) -> Result<DesignFilter> {
        let (started_at, ended_at) = self.dates.ranges()?;
        Ok(DesignFilter {
            id: self.id.clone(),
            status: self.status.clone(),
            started_at,
            ended_at,
        })
    }
}

impl ApplyListArgs {
    fn filter(&self) -> Result<ApplyFilter> {
        let (started_at, ended_at) = self.dates.ranges()?;
        Ok(ApplyFilter {
            id: self.id.clone(),
            status: self.status.clone(),
            rollback_status: self.rollback_status.clone(),
            started_at,
            ended_at,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings);

    let client = Arc::new(LayoutClient::from_settings(&settings));
    debug!(endpoints = ?client.endpoints(), "layoutctl starting");

    match cli.command {
        Command::Designs(command) => run_designs(&client, command, cli.json).await,
        Command::Applies(command) => run_applies(&client, &settings, command, cli.json).await,
        Command::Policies(command) => run_policies(&client, command, cli.json).await,
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_ranges(started: &DateRange, ended: &DateRange) {
    for (label, range) in [("started", started), ("ended", ended)] {
        if !range.is_unbounded() {
            println!("{label}: {}", format_date_range(range));
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_designs(client: &LayoutClient, command: DesignCommand, json: bool) -> Result<()> {
    match command {
        DesignCommand::List(args) => {
            let mut list = FilteredList::new(args.filter()?);
            list.set_records(
                client
                    .list_designs()
                    .await
                    .context("failed to load layout designs")?,
            );
            if json {
                return print_json(&list.visible().collect::<Vec<_>>());
            }
            println!("{}", render::design_table(list.visible()));
            println!("{} of {} designs", list.visible_len(), list.records().len());
            print_ranges(&list.filter().started_at, &list.filter().ended_at);
        }
        DesignCommand::Show { id } => {
            let detail = load_design_detail(client, &DesignId::from(id)).await;
            match (&detail.design, json) {
                (Some(design), true) => print_json(design)?,
                _ => println!("{}", render::design_detail(&detail)),
            }
            if detail.design.is_none() {
                bail!("layout design could not be loaded");
            }
        }
    }
    Ok(())
}

async fn run_applies(
    client: &Arc<LayoutClient>,
    settings: &Settings,
    command: ApplyCommand,
    json: bool,
) -> Result<()> {
    let permission = Arc::new(StaticPermission(settings.allow_control));
    let mut controller = ActionController::new(client.clone(), permission);

    let (action, args) = match command {
        ApplyCommand::List(args) => {
            let mut list = FilteredList::new(args.filter()?);
            list.set_records(
                client
                    .list_applies()
                    .await
                    .context("failed to load layout applies")?,
            );
            if json {
                return print_json(&list.visible().collect::<Vec<_>>());
            }
            println!(
                "{}",
                render::apply_table(list.visible(), |record| controller.derive_for(record))
            );
            println!("{} of {} applies", list.visible_len(), list.records().len());
            print_ranges(&list.filter().started_at, &list.filter().ended_at);
            return Ok(());
        }
        ApplyCommand::Show { id } => {
            return show_apply(client, &controller, &ApplyId::from(id), json).await;
        }
        ApplyCommand::Cancel(args) => (ControlAction::Cancel, args),
        ApplyCommand::Rollback(args) => (ControlAction::Rollback, args),
        ApplyCommand::Terminate(args) => (ControlAction::ForcedTermination, args),
        ApplyCommand::Resume(args) => (ControlAction::Resume, args),
    };

    run_control(client, &mut controller, action, args).await
}

async fn show_apply(
    client: &LayoutClient,
    controller: &ActionController,
    id: &ApplyId,
    json: bool,
) -> Result<()> {
    let detail = load_apply_detail(client, id).await;
    match (&detail.apply, json) {
        (Some(apply), true) => print_json(apply),
        _ => match describe_apply(&detail, controller) {
            Ok(rendered) => {
                println!("{rendered}");
                Ok(())
            }
            Err(errors) => {
                println!("{errors}");
                bail!("layout apply {id} could not be loaded");
            }
        },
    }
}

/// Detail view of a loaded apply, or the fetch errors when it is missing.
fn describe_apply(detail: &ApplyDetail, controller: &ActionController) -> Result<String, String> {
    match &detail.apply {
        Some(apply) => Ok(render::apply_detail(detail, &controller.derive_for(apply))),
        None => Err(render::fetch_errors(&detail.errors)),
    }
}

async fn run_control(
    client: &LayoutClient,
    controller: &mut ActionController,
    action: ControlAction,
    args: ControlArgs,
) -> Result<()> {
    let id = ApplyId::from(args.id);
    let record = client
        .get_apply(&id)
        .await
        .with_context(|| format!("failed to load layout apply {id}"))?;
    let mut events = controller.subscribe_events();

    let confirmation = controller
        .select_for_record(action, &record)
        .with_context(|| format!("cannot {action} layout apply {id}"))?;
    println!("{}", confirmation.title);
    println!("{}", confirmation.message);

    if !args.yes && !prompt("Proceed? [y/N] ")? {
        controller.cancel();
        println!("Aborted.");
        return Ok(());
    }

    loop {
        match controller.confirm().await? {
            SubmitOutcome::Succeeded => break,
            SubmitOutcome::Stale => return Ok(()),
            SubmitOutcome::Failed(failure) => {
                eprintln!("{}", failure.title);
                eprintln!("{}", failure.message);
                if let (Some(code), Some(message)) = (&failure.api_code, &failure.api_message) {
                    eprintln!("{code}: {message}");
                }
                if args.yes || !prompt("Retry? [y/N] ")? {
                    controller.cancel();
                    bail!(failure.title);
                }
            }
        }
    }

    if let Some(banner) = controller.take_success() {
        println!("{}", banner.message);
    }
    while let Ok(ControllerEvent::ReloadRequested { apply_id }) = events.try_recv() {
        let detail = load_apply_detail(client, &apply_id).await;
        match describe_apply(&detail, controller) {
            Ok(rendered) | Err(rendered) => println!("{rendered}"),
        }
    }
    Ok(())
}

async fn run_policies(client: &LayoutClient, command: PolicyCommand, json: bool) -> Result<()> {
    match command {
        PolicyCommand::List { category } => {
            let policies = client
                .list_policies(category)
                .await
                .context("failed to load policies")?;
            if json {
                return print_json(&policies);
            }
            println!("{}", render::policy_table(&policies));
        }
        PolicyCommand::Show { id } => {
            let policy = client
                .get_policy(&PolicyId::from(id))
                .await
                .context("failed to load policy")?;
            print_json(&policy)?;
        }
        PolicyCommand::Create { file } => {
            let created = client
                .create_policy(&read_draft(&file)?)
                .await
                .context("failed to create policy")?;
            println!("Created policy {}.", created.id);
        }
        PolicyCommand::Update { id, file } => {
            let updated = client
                .update_policy(&PolicyId::from(id), &read_draft(&file)?)
                .await
                .context("failed to update policy")?;
            println!("Updated policy {}.", updated.id);
        }
        PolicyCommand::Delete { id, yes } => {
            let id = PolicyId::from(id);
            if !yes && !prompt(&format!("Delete policy {id}? [y/N] "))? {
                println!("Aborted.");
                return Ok(());
            }
            client
                .delete_policy(&id)
                .await
                .context("failed to delete policy")?;
            println!("Deleted policy {id}.");
        }
    }
    Ok(())
}

fn read_draft(path: &Path) -> Result<PolicyDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid policy in '{}'", path.display()))
}

fn prompt(question: &str) -> Result<bool> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
