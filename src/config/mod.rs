pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::{AppConfig, DEFAULT_CONFIG_FILE};

#[cfg(feature = "cli")]
use crate::domain::model::{Difficulty, QuestionFocus, QuestionFormat, QuestionType, Role};
#[cfg(feature = "cli")]
use clap::Args;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "quizai")]
#[command(about = "Generate, edit and publish quizzes from the command line")]
pub struct CliConfig {
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, help = "Path to the TOML configuration")]
    pub config: String,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate questions into a draft file (created when missing)
    Generate {
        #[arg(long)]
        draft: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        num_questions: Option<u32>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        question_type: Option<QuestionFocus>,
        #[arg(long)]
        format: Option<QuestionFormat>,
        #[arg(long)]
        time_limit: Option<u32>,
        #[arg(long, help = "Source document (pdf, txt, doc, docx)")]
        file: Option<String>,
    },
    /// Append an empty question to the draft
    AddBlank {
        #[arg(long)]
        draft: String,
    },
    /// Write a new question by hand
    Add {
        #[arg(long)]
        draft: String,
        #[command(flatten)]
        question: QuestionArgs,
    },
    /// Change fields of an existing question
    Edit {
        #[arg(long)]
        draft: String,
        #[arg(long)]
        index: usize,
        #[command(flatten)]
        question: QuestionArgs,
    },
    /// Remove a question and exclude it from later generations
    Remove {
        #[arg(long)]
        draft: String,
        #[arg(long)]
        index: usize,
    },
    /// Print the draft
    Show {
        #[arg(long)]
        draft: String,
    },
    /// Sign in and publish the draft as a shareable quiz
    Publish {
        #[arg(long)]
        draft: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: Role,
    },
}

/// 題目欄位；`edit` 時省略的欄位保留原值
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct QuestionArgs {
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long = "type")]
    pub question_type: Option<QuestionType>,
    #[arg(long = "option", help = "Repeat once per option; replaces the whole list")]
    pub options: Vec<String>,
    #[arg(long)]
    pub answer: Option<String>,
    #[arg(long)]
    pub points: Option<u32>,
    #[arg(long)]
    pub explanation: Option<String>,
}
