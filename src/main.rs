use clap::Parser;
use quizai::utils::error::{ErrorSeverity, QuizError};
use quizai::utils::{logger, validation::Validate};
use quizai::config::QuestionArgs;
use quizai::{AppConfig, CliConfig, Command, LocalStorage, QuestionInput, SettingsOverrides, Workflow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = AppConfig::from_file(&cli.config);
    let json_logs = cli.log_json || config.as_ref().map(|c| c.logging.json).unwrap_or(false);
    if json_logs {
        let level = if cli.verbose {
            "debug"
        } else {
            config.as_ref().map(|c| c.log_level()).unwrap_or("info")
        };
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting quizai CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let config = match config.and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let workflow = Workflow::new(config, LocalStorage::new("."));
    if let Err(e) = run(&workflow, cli.command).await {
        exit_with(&e);
    }

    Ok(())
}

async fn run(workflow: &Workflow<LocalStorage>, command: Command) -> quizai::Result<()> {
    match command {
        Command::Generate {
            draft,
            title,
            num_questions,
            difficulty,
            question_type,
            format,
            time_limit,
            file,
        } => {
            let overrides = SettingsOverrides {
                title,
                num_questions,
                difficulty,
                question_type,
                format,
                time_limit,
            };
            let outcome = workflow.generate(&draft, &overrides, file.as_deref()).await?;
            if let Some(error) = outcome.error {
                eprintln!("❌ {}", error);
                eprintln!("💡 The draft still holds {} questions, run generate again to retry", outcome.total);
                std::process::exit(2);
            }
            println!("✅ Added {} questions ({} total)", outcome.added, outcome.total);
        }
        Command::AddBlank { draft } => {
            let total = workflow.add_blank(&draft).await?;
            println!("✅ Added question {} (blank)", total - 1);
        }
        Command::Add { draft, question } => {
            let total = workflow.add_question(&draft, &question_input(question)).await?;
            println!("✅ Added question {}", total - 1);
        }
        Command::Edit { draft, index, question } => {
            let edited = workflow.edit_question(&draft, index, &question_input(question)).await?;
            println!("✏️  Updated question {}: {}", index, edited.content);
        }
        Command::Remove { draft, index } => {
            let removed = workflow.remove(&draft, index).await?;
            println!("🗑️  Removed: {}", removed.content);
        }
        Command::Show { draft } => {
            print!("{}", workflow.show(&draft).await?);
        }
        Command::Publish { draft, email, password } => {
            let quiz = workflow.publish(&draft, &email, &password).await?;
            println!("✅ Quiz published!");
            println!("🔗 {}", quiz.share_url);
        }
        Command::Register { email, password, role } => {
            let user = workflow.register(&email, &password, role).await?;
            println!("✅ Registered {} as {}", user.email, user.role);
        }
    }
    Ok(())
}

fn question_input(args: QuestionArgs) -> QuestionInput {
    QuestionInput {
        content: args.content,
        question_type: args.question_type,
        options: args.options,
        answer: args.answer,
        points: args.points,
        explanation: args.explanation,
    }
}

fn exit_with(e: &QuizError) -> ! {
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
