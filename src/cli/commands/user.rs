use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{User, UserPayload};
use crate::database::{Entity, Repository};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a login account")]
    Add {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "admin, staff, professor, student or guardian")]
        role: String,
        #[arg(long, help = "Initial password")]
        password: String,
        #[arg(long, help = "Display name")]
        full_name: Option<String>,
    },

    #[command(about = "List login accounts")]
    List,

    #[command(about = "Reset a user's password")]
    Passwd {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "New password")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = connect().await?;

    let result = match cmd {
        UserCommands::Add {
            username,
            role,
            password,
            full_name,
        } => {
            let payload = UserPayload {
                username: Some(username),
                password: Some(password),
                role: Some(role),
                full_name,
            };
            if let Err(field_errors) = User::validate_create(&payload) {
                anyhow::bail!("invalid user: {:?}", field_errors);
            }

            let user = Repository::<User>::new(&db).create(None, &payload).await?;
            output_success(
                &output_format,
                &format!("Created user '{}' ({})", user.username, user.role),
                Some(serde_json::to_value(&user)?),
            )
        }
        UserCommands::List => {
            let mut conn = db.pool().acquire().await?;
            let users = User::list_all(&mut conn).await?;

            match output_format {
                OutputFormat::Json => output_success(&output_format, "Users", Some(json!(users))),
                OutputFormat::Text => {
                    for user in &users {
                        println!(
                            "{:>5}  {:<20} {:<10} {}",
                            user.id,
                            user.username,
                            user.role,
                            user.full_name.as_deref().unwrap_or("")
                        );
                    }
                    Ok(())
                }
            }
        }
        UserCommands::Passwd { username, password } => {
            let mut tx = db.begin(None).await?;
            let updated = User::set_password(&mut tx, &username, &password).await?;
            tx.commit().await?;

            if !updated {
                anyhow::bail!("no user named '{}'", username);
            }
            output_success(&output_format, &format!("Password updated for '{}'", username), None)
        }
    };

    db.close().await;
    result
}
