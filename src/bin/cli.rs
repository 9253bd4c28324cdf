use acquisitions::{
    config::AppConfig, db, models::user::UserRole, validation::SignUpRequest, AppState,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "acquisitions-cli")]
#[command(about = "CLI tool for managing Acquisitions API users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Role to assign (user or admin)
        #[arg(short, long, default_value = "user")]
        role: UserRole,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Change a user's role
    SetRole {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New role (user or admin)
        #[arg(short, long)]
        role: UserRole,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn prompt_new_password(
    prompt: &str,
    given: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(pw) = given {
        return Ok(pw);
    }

    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    if password != confirm {
        eprintln!("❌ Passwords do not match");
        std::process::exit(1);
    }
    Ok(password)
}

fn fail(action: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("❌ Failed to {}: {}", action, err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let state = AppState::new(config, pool);
    let user_service = state.user_service.clone();

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                password,
                role,
            } => {
                let password = prompt_new_password("Password", password)?;

                let input = match (SignUpRequest {
                    email: Some(email),
                    password: Some(password),
                })
                .validate()
                {
                    Ok(input) => input,
                    Err(errors) => {
                        for error in errors.errors() {
                            eprintln!("❌ {}: {}", error.field, error.message);
                        }
                        std::process::exit(1);
                    }
                };

                match state.auth_service.register(input, role).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                        println!("  Role: {}", user.role);
                    }
                    Err(err) => fail("create user", err),
                }
            }

            UserCommands::List { limit, offset } => {
                match user_service.all_users(Some(limit), Some(offset)).await {
                    Ok(users) => {
                        if users.is_empty() {
                            println!("No users found.");
                        } else {
                            println!(
                                "{:<5} {:<40} {:<8} {:<22}",
                                "ID", "Email", "Role", "Created"
                            );
                            println!("{}", "-".repeat(75));
                            for user in users {
                                println!(
                                    "{:<5} {:<40} {:<8} {:<22}",
                                    user.id, user.email, user.role, user.created_at
                                );
                            }
                        }
                    }
                    Err(err) => fail("list users", err),
                }
            }

            UserCommands::Delete { email } => match user_service.find_user_by_email(&email).await {
                Ok(Some(user)) => match user_service.remove_user(user.id).await {
                    Ok(()) => println!("✅ User '{}' deleted successfully!", email),
                    Err(err) => fail("delete user", err),
                },
                Ok(None) => fail("delete user", format!("user '{}' not found", email)),
                Err(err) => fail("find user", err),
            },

            UserCommands::SetRole { email, role } => {
                match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => match user_service.set_role(user.id, role).await {
                        Ok(user) => println!("✅ '{}' now has role '{}'", user.email, user.role),
                        Err(err) => fail("update role", err),
                    },
                    Ok(None) => fail("update role", format!("user '{}' not found", email)),
                    Err(err) => fail("find user", err),
                }
            }

            UserCommands::SetPassword { email, password } => {
                match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => {
                        let new_password = prompt_new_password("New password", password)?;

                        match user_service.set_password(user.id, &new_password).await {
                            Ok(()) => {
                                println!("✅ Password updated successfully for '{}'!", email);
                            }
                            Err(err) => fail("update password", err),
                        }
                    }
                    Ok(None) => fail("update password", format!("user '{}' not found", email)),
                    Err(err) => fail("find user", err),
                }
            }
        },
    }

    Ok(())
}
