use anyhow::{bail, Result};
use clap::Parser;
use katreview_core::{
    constants::MIN_PASSWORD_LENGTH,
    models::UserRole,
    password::hash_password,
};
use katreview_db::UserRepository;

#[derive(Parser, Debug)]
#[command(name = "create_admin")]
#[command(about = "Create an admin account, or reset an existing one")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, default_value = "admin")]
    username: String,

    #[arg(long)]
    email: String,

    /// Falls back to ADMIN_PASSWORD so it stays out of shell history
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    katreview_cli::init_tracing();

    let args = Args::parse();
    if args.password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
    }

    let pool = katreview_cli::connect(&args.database_url).await?;
    let users = UserRepository::new(pool);
    let password_hash = hash_password(&args.password)?;
    let email = args.email.trim().to_lowercase();

    let user = match users.find_by_username(&args.username).await? {
        Some(existing) => {
            let user = users
                .reset_credentials(existing.id, &email, &password_hash, UserRole::Admin)
                .await?;
            println!("Reset admin account '{}' (id {})", user.username, user.id);
            user
        }
        None => {
            let user = users
                .create(&args.username, &email, &password_hash, UserRole::Admin)
                .await?;
            println!("Created admin account '{}' (id {})", user.username, user.id);
            user
        }
    };

    tracing::info!(user_id = user.id, "Admin account ready");
    Ok(())
}
