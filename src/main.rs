mod cli;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cli::{Cli, Command};
use nhanhoc_client::features::chat::ChatMessage;
use nhanhoc_client::features::learning::LearningData;
use nhanhoc_client::features::pdf::PdfUpload;
use nhanhoc_client::features::quiz::QuizRequest;
use nhanhoc_client::features::resource::ResourceRequest;
use nhanhoc_client::features::roadmap::RoadmapRequest;
use nhanhoc_client::utils::init_logger;
use nhanhoc_client::{Config, Job, LearningClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.polling = config.polling.with_max_attempts(max_attempts);
    }
    info!("Using backend {}", config.api.base_url);

    let client = LearningClient::from_config(&config)?;

    // Ctrl-C stops polling at the next suspension point
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    run(cli.command, &client, &cancel).await
}

async fn run(command: Command, client: &LearningClient, cancel: &CancellationToken) -> anyhow::Result<()> {
    match command {
        Command::Health => print_json(&client.health().await?),
        Command::Roadmap { topic, time, level } => {
            let request = RoadmapRequest { topic, time, knowledge_level: level };
            let roadmap = client
                .roadmap
                .create_and_wait(&request, cancel, report_progress)
                .await?;
            print_json(&roadmap)
        }
        Command::Quiz { course, topic, subtopic, description, num_questions } => {
            let request = QuizRequest { course, topic, subtopic, description, num_questions };
            let quiz = client.quiz.create_and_wait(&request, cancel, report_progress).await?;
            print_json(&quiz)
        }
        Command::Resource { course, level, description, time } => {
            let request = ResourceRequest { course, knowledge_level: level, description, time };
            let markdown = client
                .resource
                .create_and_wait(&request, cancel, report_progress)
                .await?;
            println!("{}", markdown);
            Ok(())
        }
        Command::Chat { message, history } => {
            let mut messages: Vec<ChatMessage> = match history {
                Some(path) => read_json(&path).await?,
                None => Vec::new(),
            };
            messages.push(ChatMessage::user(message));
            let reply = client
                .chat
                .send_message(messages, None, cancel, report_progress)
                .await?;
            println!("{}", reply);
            Ok(())
        }
        Command::Recommend { data } => {
            let data = load_learning_data(data.as_deref()).await?;
            let recommendations = client
                .recommendations
                .personalized(data, cancel, report_progress)
                .await?;
            print_json(&recommendations)
        }
        Command::NextTopics { data } => {
            let data = load_learning_data(data.as_deref()).await?;
            print_json(&client.recommendations.next_topics(data).await?)
        }
        Command::Insights { data } => {
            let data = load_learning_data(data.as_deref()).await?;
            print_json(&client.analytics.insights(data, cancel, report_progress).await?)
        }
        Command::Overview { data } => {
            let data = load_learning_data(data.as_deref()).await?;
            print_json(&client.analytics.overview(data).await?)
        }
        Command::Topic { topic, data } => {
            let data = load_learning_data(data.as_deref()).await?;
            let insights = client
                .analytics
                .topic_insights(&topic, data, cancel, report_progress)
                .await?;
            print_json(&insights)
        }
        Command::StudyPlan { data } => {
            let data = load_learning_data(data.as_deref()).await?;
            print_json(&client.analytics.study_plan(data, cancel, report_progress).await?)
        }
        Command::Pdf { path, output } => {
            let upload = PdfUpload::from_path(&path).await?;
            let report = client.pdf.analyze(&upload, cancel, report_progress).await?;
            let output = output.unwrap_or_else(|| report_path(&path));
            tokio::fs::write(&output, report.decode_pdf()?)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Report saved to {}", output.display());
            Ok(())
        }
    }
}

fn report_progress<T>(job: &Job<T>) {
    match (job.progress, job.progress_message.as_deref()) {
        (Some(progress), Some(message)) => eprintln!("[{}] {:.0}% {}", job.status, progress, message),
        (Some(progress), None) => eprintln!("[{}] {:.0}%", job.status, progress),
        (None, Some(message)) => eprintln!("[{}] {}", job.status, message),
        (None, None) => eprintln!("[{}]", job.status),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Learning history from a JSON file, or an empty history.
async fn load_learning_data(path: Option<&Path>) -> anyhow::Result<LearningData> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(LearningData::default()),
    }
}

fn report_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "analysis".to_string());
    input.with_file_name(format!("{}.report.pdf", stem))
}
