use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs, io::AsyncWriteExt};

use reelnote_core::{
    AppConfig, CommentBoard, DocumentStore, FolderId, FolderReview, FsDocumentStore,
    FsObjectStore, HttpJobBackend, JobBackend, NewComment, Notice, ObjectStore, PollEvent,
    PollOutcome, Provider, ReviewContext, Session, StatusPoller, Summarizer, TaskId, UserRecord,
    format_size, get_documents_dir, get_objects_dir,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliProvider {
    #[value(name = "openrouter")]
    OpenRouter,
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::OpenRouter => Provider::OpenRouter,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "reelnote", version)]
#[command(
    about = "Upload videos for transcription, follow processing, and review summaries and comments"
)]
struct Cli {
    /// Act as this signed-in user (overrides REELNOTE_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Processing backend base URL (overrides REELNOTE_BACKEND_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video and follow its processing
    Upload {
        file: PathBuf,

        /// Print the task id and return without polling
        #[arg(long)]
        no_wait: bool,
    },
    /// Query a job's status once
    Status { task_id: String },
    /// Follow an existing job until it finishes
    Watch { task_id: String },
    /// List result folders
    Folders,
    /// Show a folder's files and extracted text
    Show { folder: String },
    /// Print a folder's stored summary
    Summary { folder: String },
    /// Generate and store a summary from the folder's extracted text
    Summarize {
        folder: String,

        /// AI provider (defaults to REELNOTE_PROVIDER)
        #[arg(short, long)]
        provider: Option<CliProvider>,
    },
    /// Save a folder's video to a file
    Video {
        folder: String,

        #[arg(short, long)]
        out: PathBuf,
    },
    /// Comments anchored to the extracted text
    Comments {
        #[command(subcommand)]
        action: CommentsCommand,
    },
    /// Record the signed-in user's profile
    SyncUser {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum CommentsCommand {
    List {
        folder: String,
    },
    /// Comment on the characters `start..end` of the extracted text
    Add {
        folder: String,

        #[arg(long)]
        start: usize,

        #[arg(long)]
        end: usize,

        text: String,
    },
    Edit {
        folder: String,
        comment_id: String,
        text: String,
    },
    Delete {
        folder: String,
        comment_id: String,
    },
    /// Summarize what the comments say about the video
    Digest {
        folder: String,

        #[arg(short, long)]
        provider: Option<CliProvider>,
    },
}

impl Command {
    fn action(&self) -> &'static str {
        match self {
            Command::Upload { .. } => "Upload failed",
            Command::Status { .. } | Command::Watch { .. } => "Could not check job status",
            Command::Folders | Command::Show { .. } => "Could not load folder",
            Command::Summary { .. } => "Could not load summary",
            Command::Summarize { .. } => "Summary generation failed",
            Command::Video { .. } => "Could not load video",
            Command::Comments { action } => match action {
                CommentsCommand::List { .. } => "Could not load comments",
                CommentsCommand::Add { .. } => "Could not add comment",
                CommentsCommand::Edit { .. } => "Could not edit comment",
                CommentsCommand::Delete { .. } => "Could not delete comment",
                CommentsCommand::Digest { .. } => "Comment digest failed",
            },
            Command::SyncUser { .. } => "Could not sync user",
        }
    }
}

struct App {
    config: AppConfig,
    session: Session,
    objects: FsObjectStore,
    documents: FsDocumentStore,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            session: Session::from_user(config.user.clone()),
            objects: FsObjectStore::new(get_objects_dir(&config.data_dir)),
            documents: FsDocumentStore::new(get_documents_dir(&config.data_dir)),
            config,
        }
    }

    fn context(&self, folder: &str) -> Result<ReviewContext> {
        Ok(ReviewContext::for_folder(
            self.session.clone(),
            FolderId::parse(folder)?,
        ))
    }

    fn review(&self) -> FolderReview<'_> {
        FolderReview::new(&self.objects, &self.documents)
    }

    fn summarizer(&self, provider: Option<CliProvider>) -> Result<Summarizer> {
        let provider = provider.map(Provider::from).unwrap_or(self.config.provider);
        Ok(Summarizer::new(&provider)?)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_progress_bar(len: u64, template: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(user) = cli.user {
        config.user = Some(user).filter(|u| !u.trim().is_empty());
    }
    if let Some(backend) = cli.backend {
        config.backend_url = backend.trim_end_matches('/').to_string();
    }
    init_tracing(&config.log_filter);

    let action = cli.command.action();
    if let Err(e) = run(App::new(config), cli.command).await {
        let notice = Notice::from_failure(action, &*e);
        eprintln!("{} {}", style("Error:").red().bold(), notice);
        std::process::exit(1);
    }
}

async fn run(app: App, command: Command) -> Result<()> {
    match command {
        Command::Upload { file, no_wait } => upload(&app, file, no_wait).await,
        Command::Status { task_id } => status(&app, TaskId(task_id)).await,
        Command::Watch { task_id } => {
            let mut ctx = ReviewContext::new(app.session.clone());
            ctx.track(TaskId(task_id));
            watch(&app, backend(&app), &mut ctx).await
        }
        Command::Folders => folders(&app).await,
        Command::Show { folder } => show(&app, &folder).await,
        Command::Summary { folder } => {
            let summary = app.review().summary(&app.context(&folder)?).await?;
            if summary.trim().is_empty() {
                println!(
                    "{}",
                    style(format!("No summary yet. Run `reelnote summarize {folder}`.")).dim()
                );
            } else {
                println!("{summary}");
            }
            Ok(())
        }
        Command::Summarize { folder, provider } => summarize(&app, &folder, provider).await,
        Command::Video { folder, out } => video(&app, &folder, out).await,
        Command::Comments { action } => comments(&app, action).await,
        Command::SyncUser { email, name } => {
            let user = app.session.user_record(email, name)?;
            sync_user(&app, &user).await
        }
    }
}

fn backend(app: &App) -> Arc<dyn JobBackend> {
    Arc::new(HttpJobBackend::new(app.config.backend_url.as_str()))
}

async fn upload(app: &App, file: PathBuf, no_wait: bool) -> Result<()> {
    println!(
        "\n{}  {}\n",
        style("reelnote").cyan().bold(),
        style("Video Notes").dim()
    );

    let backend = backend(app);
    let spinner = create_spinner("Uploading video...");
    let task_id = backend
        .upload(&file)
        .await
        .inspect_err(|_| spinner.finish_and_clear())?;
    spinner.finish_with_message(format!(
        "{} Uploaded: {}",
        style("✓").green().bold(),
        style(&task_id).dim()
    ));

    if no_wait {
        println!("Follow it with `reelnote watch {task_id}`");
        return Ok(());
    }

    let mut ctx = ReviewContext::new(app.session.clone());
    ctx.track(task_id);
    watch(app, backend, &mut ctx).await
}

async fn status(app: &App, task_id: TaskId) -> Result<()> {
    let job = backend(app).status(&task_id).await?;
    println!(
        "{} {} {}",
        style(&job.task_id).dim(),
        style(job.status.label()).yellow(),
        style(format!("{:.0}%", job.percent())).dim()
    );
    if let Some(folder) = &job.folder_id {
        println!("Folder: {}", style(folder).cyan());
    }
    Ok(())
}

/// Poll until the job finishes. Ctrl-C stops polling; the job itself keeps
/// running on the backend.
async fn watch(app: &App, backend: Arc<dyn JobBackend>, ctx: &mut ReviewContext) -> Result<()> {
    let task_id = ctx.task().cloned().context("no job to watch")?;
    let poller = StatusPoller::new(backend, app.config.poll_interval);
    let mut handle = poller.start(task_id.clone());

    let bar = create_progress_bar(100, "{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}");
    bar.set_message("Waiting for the backend...");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut verdict: Option<Notice> = None;
    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match &event {
                    PollEvent::Progress(job) => {
                        bar.set_position(job.percent().round() as u64);
                        bar.set_message(job.status.label().to_string());
                    }
                    PollEvent::RequestFailed { .. } => {
                        if let Some(notice) = event.notice() {
                            bar.println(format!("{} {}", style("!").yellow().bold(), notice));
                        }
                    }
                    PollEvent::Completed(_) | PollEvent::Failed(_) => verdict = event.notice(),
                }
            }
            _ = &mut ctrl_c => {
                bar.abandon_with_message("stopped");
                handle.stop();
                println!("Still processing. Resume with `reelnote watch {task_id}`");
                return Ok(());
            }
        }
    }

    let outcome = handle.wait().await;
    match &outcome {
        PollOutcome::Completed(_) => {
            bar.finish_and_clear();
            let message = verdict.map(|n| n.message).unwrap_or_default();
            println!("{} {}", style("✓").green().bold(), message);
            if let Some(folder) = ctx.settle(&outcome) {
                println!(
                    "  Folder: {}  {}",
                    style(folder).cyan(),
                    style(format!("(reelnote show {folder})")).dim()
                );
            } else {
                println!("{}", style("  The backend reported no result folder").yellow());
            }
            Ok(())
        }
        PollOutcome::Failed(_) => {
            bar.abandon();
            bail!(
                "{}",
                verdict
                    .map(|n| n.message)
                    .unwrap_or_else(|| "Error processing video".into())
            )
        }
        PollOutcome::NotFound(task_id) => {
            bar.abandon();
            bail!("task {task_id} is unknown to the backend")
        }
        PollOutcome::Cancelled => {
            bar.abandon();
            bail!("polling stopped before the job finished")
        }
    }
}

async fn folders(app: &App) -> Result<()> {
    let folders = app.objects.list_folders().await?;
    if folders.is_empty() {
        println!("{}", style("No folders yet").dim());
    }
    for folder in folders {
        println!("{}", style(folder).cyan());
    }
    Ok(())
}

async fn show(app: &App, folder: &str) -> Result<()> {
    let artifacts = app.review().artifacts(&app.context(folder)?).await?;

    println!("{}", style(&artifacts.folder_id).cyan().bold());
    for file in &artifacts.files {
        println!(
            "  {:<40} {:>10}  {}",
            file.path,
            format_size(file.size),
            style(file.last_modified.format("%Y-%m-%d %H:%M")).dim()
        );
    }

    match &artifacts.video {
        Some(video) => println!("\n{} {}", style("Video:").bold(), video.path),
        None => println!("\n{}", style("No video in this folder").dim()),
    }
    match &artifacts.text {
        Some(text) => println!("\n{}\n{}", style("Extracted text:").bold(), text),
        None => println!("{}", style("No extracted text yet").dim()),
    }
    Ok(())
}

async fn summarize(app: &App, folder: &str, provider: Option<CliProvider>) -> Result<()> {
    let summarizer = app.summarizer(provider)?;
    let ctx = app.context(folder)?;

    let spinner = create_spinner(&format!("Summarizing with {}...", summarizer.model()));
    let summary = app
        .review()
        .summarize(&ctx, &summarizer)
        .await
        .inspect_err(|_| spinner.finish_and_clear())?;
    spinner.finish_with_message(format!("{} Summary stored", style("✓").green().bold()));

    println!("\n{summary}");
    Ok(())
}

async fn video(app: &App, folder: &str, out: PathBuf) -> Result<()> {
    let mut video = app.review().open_video(&app.context(folder)?).await?;

    let bar = create_progress_bar(
        video.meta.content_length,
        "{spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
    );
    bar.set_message(video.meta.content_type.clone());

    let mut file = fs::File::create(&out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;
    while let Some(chunk) = video.body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        bar.inc(chunk.len() as u64);
    }
    file.flush().await?;

    bar.finish_and_clear();
    println!(
        "{} Saved {} ({})",
        style("✓").green().bold(),
        out.display(),
        format_size(video.meta.content_length)
    );
    Ok(())
}

async fn comments(app: &App, action: CommentsCommand) -> Result<()> {
    let board = CommentBoard::new(&app.documents);

    match action {
        CommentsCommand::List { folder } => {
            let comments = board.list(&FolderId::parse(folder)?).await?;
            if comments.is_empty() {
                println!("{}", style("No comments yet").dim());
            }
            for c in comments {
                println!(
                    "{} {} {}{}",
                    style(&c.comment_id).dim(),
                    style(c.commented_by.as_deref().unwrap_or("anonymous")).cyan(),
                    style(c.timestamp.format("%Y-%m-%d %H:%M")).dim(),
                    if c.edited {
                        style(" (edited)").dim().to_string()
                    } else {
                        String::new()
                    }
                );
                println!(
                    "  {} {}",
                    style(format!(
                        "[{}..{}] \"{}\"",
                        c.ref_text.start_index, c.ref_text.end_index, c.ref_text.text
                    ))
                    .italic(),
                    c.text
                );
            }
        }
        CommentsCommand::Add {
            folder,
            start,
            end,
            text,
        } => {
            let ctx = app.context(&folder)?;
            let ref_text = app.review().anchor(&ctx, start, end).await?;
            let comment = board.add(&ctx, NewComment { text, ref_text }).await?;
            println!(
                "{} Comment added: {}",
                style("✓").green().bold(),
                style(&comment.comment_id).dim()
            );
        }
        CommentsCommand::Edit {
            folder,
            comment_id,
            text,
        } => {
            let comment = board
                .edit(&app.context(&folder)?, &comment_id, &text)
                .await?;
            println!(
                "{} Comment edited: {}",
                style("✓").green().bold(),
                style(&comment.comment_id).dim()
            );
        }
        CommentsCommand::Delete { folder, comment_id } => {
            let remaining = board.delete(&app.context(&folder)?, &comment_id).await?;
            println!(
                "{} Comment deleted, {} remaining",
                style("✓").green().bold(),
                remaining.len()
            );
        }
        CommentsCommand::Digest { folder, provider } => {
            let summarizer = app.summarizer(provider)?;
            let ctx = app.context(&folder)?;
            let spinner = create_spinner("Summarizing comments...");
            let digest = app
                .review()
                .digest_comments(&ctx, &summarizer)
                .await
                .inspect_err(|_| spinner.finish_and_clear())?;
            spinner.finish_and_clear();
            println!("{digest}");
        }
    }
    Ok(())
}

async fn sync_user(app: &App, user: &UserRecord) -> Result<()> {
    app.documents.put_user(user).await?;
    println!(
        "{} Synced {} ({})",
        style("✓").green().bold(),
        user.name,
        style(&user.user_id).dim()
    );
    Ok(())
}
