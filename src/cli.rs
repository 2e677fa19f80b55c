use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nhanhoc_client::features::roadmap::KnowledgeLevel;

#[derive(Parser)]
#[command(name = "nhanhoc")]
#[command(about = "Submit jobs to the NhanHoc learning backend and wait for their results.")]
pub(crate) struct Cli {
    /// Backend base URL (overrides NHANHOC_API_BASE_URL).
    #[arg(long, global = true)]
    pub(crate) base_url: Option<String>,

    /// Override the number of status polls per job.
    #[arg(long, global = true)]
    pub(crate) max_attempts: Option<u32>,

    /// -v for debug logs, -vv for trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check that the backend is up.
    Health,
    /// Generate a week-by-week learning roadmap.
    Roadmap {
        topic: String,
        /// Total study time, e.g. "4 weeks".
        #[arg(long, default_value = "4 weeks")]
        time: String,
        #[arg(long, default_value = "beginner")]
        level: KnowledgeLevel,
    },
    /// Generate a multiple-choice quiz for one subtopic.
    Quiz {
        #[arg(long)]
        course: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        subtopic: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        num_questions: Option<u32>,
    },
    /// Generate Markdown study material.
    Resource {
        #[arg(long)]
        course: String,
        #[arg(long, default_value = "Beginner")]
        level: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "1 week")]
        time: String,
    },
    /// Ask the tutor a question.
    Chat {
        message: String,
        /// JSON file holding earlier messages of the conversation.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Personalized recommendations from a learning-data JSON file.
    Recommend {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Suggested next topics (synchronous).
    NextTopics {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// AI insights on strengths and weaknesses.
    Insights {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Progress metrics (synchronous).
    Overview {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Insights for a single topic.
    Topic {
        topic: String,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Seven-day study plan.
    StudyPlan {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Analyze a PDF and save the generated report.
    Pdf {
        path: PathBuf,
        /// Where to write the report (default: <name>.report.pdf next to the input).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
