//! Estate Client CLI
//!
//! Signs in against the property-management backend and issues raw API calls
//! with the stored session.

use estate_client::api::{ApiClient, Method, RequestBody, RequestOptions};
use estate_client::auth::{AuthClient, Credentials, LoginOutcome, OtpDestination, OtpVerification, Role};
use estate_client::bus::{self, BusEvent, NotificationLevel};
use estate_client::config;
use estate_client::session::{FileStore, Session};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "estate-client", version = env!("ESTATE_VERSION"), about)]
struct Cli {
    /// Override the configured API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in as the given role
    Login {
        #[arg(long)]
        role: Role,
        #[arg(long, conflicts_with = "phone", required_unless_present = "phone")]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: String,
        #[arg(long)]
        remember: bool,
    },
    /// Complete a signin that asked for a one-time password
    VerifyOtp {
        #[arg(long)]
        role: Role,
        #[arg(long, conflicts_with = "phone", required_unless_present = "phone")]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the stored session
    Status,
    /// Call an endpoint with the stored session and print the result
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Endpoint relative to the base URL, e.g. /property-manager/leads
        endpoint: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
        /// Print the body without unwrapping `data`
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::debug!(
        "Estate Client v{} ({})",
        env!("ESTATE_VERSION"),
        env!("ESTATE_GIT_SHA")
    );

    let mut config = config::load_config()?;
    if let Some(base_url) = cli.base_url {
        config::validate_base_url(&base_url)?;
        config.api_base_url = base_url;
    }

    let data_dir = config::get_data_dir();
    let store = FileStore::open(&data_dir);
    tracing::debug!("Session file: {}", store.path().display());
    let session = Session::new(Arc::new(store));

    let bus = bus::create_bus();
    let mut events = bus.subscribe();

    let api = ApiClient::from_config(&config, session, bus)?;
    let auth = AuthClient::new(api.clone());

    let result = run(cli.command, &api, &auth).await;
    print_events(&mut events);
    result
}

async fn run(command: Command, api: &ApiClient, auth: &AuthClient) -> Result<()> {
    match command {
        Command::Login {
            role,
            email,
            phone,
            password,
            remember,
        } => {
            let credentials = Credentials {
                email,
                phone,
                password,
                remember_me: remember,
            };
            match auth.login(role, &credentials).await? {
                LoginOutcome::Authenticated { user } => {
                    let name = user.and_then(|u| u.name).unwrap_or_default();
                    println!("Signed in as {} {}", role.label(), name);
                }
                LoginOutcome::OtpRequired {
                    destination,
                    message,
                } => {
                    let target = match destination {
                        OtpDestination::Email(email) => email,
                        OtpDestination::Phone(phone) => phone,
                        OtpDestination::Unknown => "your registered contact".to_string(),
                    };
                    println!(
                        "{}",
                        message.unwrap_or_else(|| format!("A verification code was sent to {}", target))
                    );
                    println!(
                        "Run `estate-client verify-otp --role {} --email|--phone <contact> --otp <code>` to continue",
                        role
                    );
                }
                LoginOutcome::Registered { .. } => {
                    return Err(anyhow!("unexpected signup response from signin"));
                }
            }
        }
        Command::VerifyOtp {
            role,
            email,
            phone,
            otp,
            remember,
        } => {
            let verification = OtpVerification {
                email,
                phone,
                otp,
                remember_me: remember,
            };
            auth.verify_otp(role, &verification).await?;
            println!("Signed in as {}", role.label());
        }
        Command::Logout => {
            auth.logout().await?;
            println!("Signed out");
        }
        Command::Status => {
            let state = auth.state();
            match (state.is_authenticated, state.role) {
                (true, Some(role)) => println!(
                    "Signed in as {} (remember me: {})",
                    role.label(),
                    if state.remember_me { "yes" } else { "no" }
                ),
                (true, None) => println!("Signed in (no role stored)"),
                (false, _) => println!("Not signed in"),
            }
            println!("API: {}", api.base_url());
        }
        Command::Request {
            method,
            endpoint,
            data,
            raw,
        } => {
            let method: Method = method
                .to_ascii_uppercase()
                .parse()
                .with_context(|| format!("invalid HTTP method {:?}", method))?;
            let body = data
                .map(|d| serde_json::from_str::<serde_json::Value>(&d).context("--data is not valid JSON"))
                .transpose()?
                .map(RequestBody::Json);
            let options = if raw {
                RequestOptions::raw()
            } else {
                RequestOptions::default()
            };

            let value = api.request(method, &endpoint, body, options).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

/// Surface queued notifications and redirects on stderr
fn print_events(events: &mut broadcast::Receiver<BusEvent>) {
    loop {
        match events.try_recv() {
            Ok(BusEvent::Notification { level, message }) => match level {
                NotificationLevel::Success => eprintln!("✓ {}", message),
                NotificationLevel::Error => eprintln!("✗ {}", message),
                NotificationLevel::Info => eprintln!("  {}", message),
            },
            Ok(BusEvent::Navigate { route }) => {
                tracing::info!("Session expired, sign in again ({})", route)
            }
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!("Dropped {} UI events", n);
            }
            Err(_) => break,
        }
    }
}
