//! Command handlers.

use std::path::PathBuf;

use opsdeck_application::{
    ConfigurationRepository, HistoryEvent, JobWorkflow, SubmittedJob, UserRepository,
    WorkflowError,
};
use opsdeck_domain::{
    ExportFormat, ExportRequest, ExportSelection, ImportRequest, Job, JobId, Navigation,
    ProcessSelector, UserFilter, View,
};
use opsdeck_infrastructure::{read_upload_files, to_pretty_json};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::cli::{Command, ProcessCommand, UserCommand};
use crate::console::Console;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Runs one command against the wired console.
pub async fn run(console: &Console, command: Command) -> CommandResult {
    match command {
        Command::Envs => list_environments(console),
        Command::Import {
            files,
            process,
            category,
            detach,
        } => import(console, &files, process, category, detach).await,
        Command::Export {
            processes,
            filter,
            format,
            detach,
        } => export(console, processes, filter, format, detach).await,
        Command::Processes(command) => processes(console, command).await,
        Command::Users(command) => users(console, command).await,
        Command::Open { target } => open(console, &target).await,
    }
}

fn list_environments(console: &Console) -> CommandResult {
    let active = console.registry.active();
    for environment in console.registry.list_environments() {
        let marker = if environment.id == active.id { '*' } else { ' ' };
        println!(
            "{marker} {:<12} {:<20} {}",
            environment.id,
            environment.label,
            environment.api_base_url()
        );
    }
    Ok(())
}

async fn import(
    console: &Console,
    files: &[PathBuf],
    process: String,
    category: Option<String>,
    detach: bool,
) -> CommandResult {
    let uploads = read_upload_files(files).await?;
    let mut target = ProcessSelector::process(process);
    if let Some(category) = category {
        target = target.with_category(category);
    }

    let submitted = console
        .workflow
        .submit_import(ImportRequest::new(uploads, target))
        .await?;
    finish(&console.workflow, &submitted, detach).await
}

async fn export(
    console: &Console,
    process_ids: Vec<String>,
    filter: Option<String>,
    format: ExportFormat,
    detach: bool,
) -> CommandResult {
    let selection = ExportSelection {
        process_ids,
        filter,
    };
    let submitted = console
        .workflow
        .submit_export(ExportRequest::new(selection, format))
        .await?;
    finish(&console.workflow, &submitted, detach).await
}

async fn finish(workflow: &JobWorkflow, submitted: &SubmittedJob, detach: bool) -> CommandResult {
    let id = submitted.job.id();
    println!(
        "submitted {} job {id} to {}",
        submitted.job.kind(),
        submitted.binding.environment_id
    );
    if detach {
        return Ok(());
    }

    let job = follow(workflow, id).await?;
    print_json(&job)
}

/// Waits for a job while printing its status changes.
///
/// The first Ctrl-C cancels every unfinished job of the session, this one
/// included; the wait then ends once the cancellation has been recorded.
async fn follow(workflow: &JobWorkflow, id: &JobId) -> Result<Job, WorkflowError> {
    let mut events = workflow.history().subscribe();
    let wait = workflow.wait(id);
    tokio::pin!(wait);
    let mut interrupted = false;

    loop {
        tokio::select! {
            result = &mut wait => return result,
            event = events.recv() => match event {
                Ok(HistoryEvent::Updated(job)) if job.id() == id => print_progress(&job),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return workflow.wait(id).await,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if let Err(error) = signal {
                    warn!(%error, "cannot listen for Ctrl-C");
                    continue;
                }
                eprintln!("cancelling {id}...");
                let cancelled = workflow.cancel_all();
                debug!(cancelled, "cancellation requested");
            }
        }
    }
}

fn print_progress(job: &Job) {
    match job.progress() {
        Some(progress) => eprintln!("{} {} ({progress}%)", job.id(), job.status()),
        None => eprintln!("{} {}", job.id(), job.status()),
    }
}

async fn processes(console: &Console, command: ProcessCommand) -> CommandResult {
    match command {
        ProcessCommand::List => {
            for process in console.processes.list().await? {
                let state = if process.enabled { "enabled" } else { "disabled" };
                println!(
                    "{:<20} {:<30} {:<16} {state}",
                    process.id,
                    process.name,
                    process.category.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        ProcessCommand::Get { id } => print_json(&console.processes.get(&id).await?),
        ProcessCommand::SetParam { id, key, value } => {
            print_json(&console.processes.set_parameter(&id, &key, &value).await?)
        }
    }
}

async fn users(console: &Console, command: UserCommand) -> CommandResult {
    match command {
        UserCommand::List {
            role,
            active,
            inactive,
            search,
        } => {
            let filter = UserFilter {
                role,
                active: match (active, inactive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                search,
            };
            for user in console.users.list(&filter).await? {
                println!(
                    "{:<16} {:<20} {:<10} {}",
                    user.id,
                    user.username,
                    user.role.as_str(),
                    user.display_name.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        UserCommand::Get { id } => print_json(&console.users.get(&id).await?),
    }
}

/// Prints the view and, when focused, the record it points at.
async fn open(console: &Console, target: &Navigation) -> CommandResult {
    println!("{}", target.view.label());
    let Some(record) = target.target_record.as_deref() else {
        return Ok(());
    };

    match target.view {
        View::Configuration | View::Import | View::Export => {
            print_json(&console.processes.get(record).await?)
        }
        View::Management => print_json(&console.users.get(record).await?),
        View::Architecture => {
            println!("{record}");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CommandResult {
    print!("{}", to_pretty_json(value)?);
    Ok(())
}
