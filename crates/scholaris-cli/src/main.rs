use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use scholaris_cli::{NewSuperAdmin, create_super_admin};
use scholaris_db::{init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "scholaris-cli")]
#[command(about = "Scholaris CLI - Administrative tools for Scholaris", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a super admin account
    CreateSuperadmin {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'u', long)]
        username: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Prompted without echo when omitted
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Apply pending database migrations
    Migrate,
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {}", label.to_lowercase())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::CreateSuperadmin {
            first_name,
            last_name,
            username,
            email,
            password,
        } => {
            let admin = NewSuperAdmin {
                first_name: prompt(first_name, "First name")?,
                last_name: prompt(last_name, "Last name")?,
                username: prompt(username, "Username")?,
                email: prompt(email, "Email address")?,
                password: match password {
                    Some(password) => password,
                    None => Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords don't match")
                        .interact()
                        .context("Failed to read password")?,
                },
            };

            let user_id = create_super_admin(&pool, &admin).await?;

            println!("Super admin created");
            println!("   Id: {}", user_id);
            println!("   Username: {}", admin.username);
        }
        Commands::Migrate => {
            run_migrations(&pool).await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}
