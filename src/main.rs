use clap::{Parser, Subcommand};
use gatehouse::config::Config;
use gatehouse::handlers::auth::{LoginRequest, SignupRequest};
use gatehouse::types::ApiResponse;
use gatehouse::{AuthHandler, GatehouseState};
use mimalloc::MiMalloc;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "gatehouse", version, about = "Account signup, login and schema migrations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations and print what ran.
    Migrate,
    /// List the migrations ledger, most recent first.
    Migrations,
    /// Create an account.
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GATEHOUSE_PASSWORD")]
        password: String,
    },
    /// Log in by username or email.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "GATEHOUSE_PASSWORD")]
        password: String,
    },
    /// Check a session token and print its claims.
    Verify { token: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        loglevel = %cfg.loglevel,
        skip_policy = ?cfg.skip_policy
    );

    let state = match GatehouseState::open(&cfg).await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "startup aborted");
            emit(&ApiResponse::<()>::err(&e))?;
            std::process::exit(1);
        }
    };
    let handler = AuthHandler::new(state.clone());

    let ok = match cli.command {
        Command::Migrate => emit(&ApiResponse::ok(state.migration_report))?,
        Command::Migrations => emit(&handler.migrations().await)?,
        Command::Signup {
            username,
            email,
            password,
        } => emit(
            &handler
                .signup(SignupRequest {
                    username,
                    email,
                    password,
                })
                .await,
        )?,
        Command::Login { username, password } => {
            emit(&handler.login(LoginRequest { username, password }).await)?
        }
        Command::Verify { token } => emit(&handler.verify(&token).await)?,
    };

    state.pool.close().await;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn emit<T: Serialize>(resp: &ApiResponse<T>) -> Result<bool, serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    Ok(resp.success)
}
