use clap::{Parser, Subcommand};
use gritflow::engine::{ReadingSignals, calculate_adaptation, generate_question_set};
use gritflow::error::{AppError, AppResult};
use gritflow::model::entity::{Subtopic, SubtopicCreate, Topic, TopicCreate, UserEntity, UserEntityCreateUpdate};
use gritflow::model::{CrudRepository, DbConnection, ModelManager};
use gritflow::web::AuthenticatedUser;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the Grit Flow database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage topics
    Topic {
        #[command(subcommand)]
        action: TopicCommands,
    },

    /// Manage subtopics
    Subtopic {
        #[command(subcommand)]
        action: SubtopicCommands,
    },

    /// Inspect quiz generation without a database
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Topic management
#[derive(Subcommand, Debug)]
pub enum TopicCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Subtopic management
#[derive(Subcommand, Debug)]
pub enum SubtopicCommands {
    Add {
        /// Topic title to attach the subtopic to
        #[arg(long)]
        topic_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with subtopic content
        #[arg(long)]
        file: String,
        /// Authored complexity, 1 to 4
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=4))]
        complexity: i32,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    /// Print a generated question set as JSON
    Preview {
        #[arg(long)]
        complexity: i32,
        #[arg(long, default_value_t = 0)]
        modifier: i32,
        #[arg(long, default_value = "the topic")]
        topic: String,
    },
    /// Print the adaptation computed from reading signals
    Adapt {
        #[arg(long)]
        complexity: i32,
        /// Pixels per second
        #[arg(long)]
        scroll_speed: f64,
        #[arg(long, default_value_t = 0)]
        pause_points: u32,
        #[arg(long, default_value_t = 0)]
        revisit_count: u32,
        /// Seconds
        #[arg(long)]
        time_on_page: f64,
    },
}

fn database() -> AppResult<DbConnection> {
    let url = std::env::var("DATABASE_URL").map_err(|_| AppError::MissingEnv("DATABASE_URL"))?;
    Ok(DbConnection::connect(&url)?)
}

fn connect() -> AppResult<ModelManager> {
    Ok(ModelManager::new(database()?))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::Migrate => {
            database()?.migrate().await?;
            println!("Migrations applied");
        }

        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let mm = connect()?;
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: gritflow::auth::hash_password(&password)?,
                        role: Some(role),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Topic { action } => match action {
            TopicCommands::Add { title, description, order_index } => {
                let mm = connect()?;
                let topic = Topic::create(
                    &mm,
                    &actor,
                    TopicCreate {
                        title,
                        description,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Topic created: {:?}", topic);
            }
        },

        Commands::Subtopic { action } => match action {
            SubtopicCommands::Add { topic_title, title, file, complexity, order_index } => {
                let mm = connect()?;
                let topic = Topic::find_by_title(&mm, &actor, &topic_title)
                    .await?
                    .ok_or_else(|| AppError::InvalidArgument(format!("topic `{topic_title}` not found")))?;

                let content = std::fs::read_to_string(file)?;
                let subtopic = Subtopic::create(
                    &mm,
                    &actor,
                    SubtopicCreate {
                        topic_id: topic.id(),
                        title,
                        content,
                        order_index: Some(order_index),
                        complexity_score: complexity,
                    },
                )
                .await?;
                println!("Subtopic created: {} ({})", subtopic.title(), subtopic.id());
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Preview { complexity, modifier, topic } => {
                let set = generate_question_set(complexity, modifier, &topic)?;
                println!("{}", serde_json::to_string_pretty(&set)?);
            }
            QuizCommands::Adapt {
                complexity,
                scroll_speed,
                pause_points,
                revisit_count,
                time_on_page,
            } => {
                let signals = ReadingSignals {
                    scroll_speed,
                    pause_points,
                    revisit_count,
                    time_on_page,
                };
                let adaptation = calculate_adaptation(&signals, complexity)?;
                println!("{}", serde_json::to_string_pretty(&adaptation)?);
            }
        },
    }

    Ok(())
}
