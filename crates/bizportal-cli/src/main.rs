//! bizportal - a command-line front end for the portal backend.
//!
//! Signs in, shows the menu and organizations, and checks which page a
//! location would open, using the same session rules as the web client.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bizportal_core::localization::keys;
use bizportal_core::{Config, LoginRequest, MenuItem, PortalContext, SessionState, ToastQueue};

/// Environment variable holding the sign-in password
const PASSWORD_ENV: &str = "BIZPORTAL_PASSWORD";

#[derive(Parser)]
#[command(name = "bizportal", version, about = "Sign in to the portal backend and browse what you can reach")]
struct Cli {
    /// Backend base URL, e.g. https://erp.example.com/api
    #[arg(long, env = "BIZPORTAL_API_URL", global = true)]
    api_url: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in
    Login {
        #[arg(short, long, env = "BIZPORTAL_USERCODE")]
        usercode: Option<String>,
        #[arg(short, long)]
        orgcode: Option<String>,
        /// Business date to sign in for (YYYY-MM-DD)
        #[arg(long)]
        basedate: Option<NaiveDate>,
        /// Keep the credential after this process exits
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and forget the stored credential
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the menu for the current language
    Menu,
    /// List organizations offered on the sign-in form
    Orgs,
    /// Show where a location would take you right now
    Navigate { location: String },
    /// Show or change the UI language (ZH, VI, JA)
    Language { code: Option<String> },
    /// Show session, menu and organizations together
    Status,
    /// Request a password reset email
    ResetPassword { email: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "bizportal.log".into());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref());
    info!("bizportal starting");

    let mut config = Config::load()
        .context("Failed to load config")?
        .with_env_overrides();
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = Some(url);
    }

    let toasts = Arc::new(ToastQueue::new());
    let ctx = PortalContext::start(config, toasts.clone())?;

    let result = run(&ctx, cli.command).await;

    for toast in toasts.drain() {
        eprintln!("✗ {}", toast.message);
    }

    ctx.shutdown();
    info!("bizportal shutting down");
    result
}

async fn run(ctx: &PortalContext, command: Command) -> Result<()> {
    match command {
        Command::Login {
            usercode,
            orgcode,
            basedate,
            remember,
        } => login(ctx, usercode, orgcode, basedate, remember).await,
        Command::Logout => {
            ctx.session.logout().await;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => whoami(ctx).await,
        Command::Menu => {
            restore_session(ctx).await?;
            let menu = ctx.api.menu_items(ctx.localizer.language()).await?;
            print_menu(&menu);
            Ok(())
        }
        Command::Orgs => {
            for org in ctx.api.orgs().await? {
                println!("{}", org.display_name());
            }
            Ok(())
        }
        Command::Navigate { location } => navigate(ctx, &location).await,
        Command::Language { code } => language(ctx, code),
        Command::Status => status(ctx).await,
        Command::ResetPassword { email } => {
            let outcome = ctx.session.reset_password(&email).await?;
            debug!(?outcome, "Password reset");
            println!("Password reset requested for {}", email);
            Ok(())
        }
    }
}

async fn login(
    ctx: &PortalContext,
    usercode: Option<String>,
    orgcode: Option<String>,
    basedate: Option<NaiveDate>,
    remember: bool,
) -> Result<()> {
    let usercode = match usercode.or_else(|| ctx.config.last_usercode.clone()) {
        Some(code) => code,
        None => prompt(&ctx.localizer.translate(keys::LOGIN_FORM_USERCODE))?,
    };
    let orgcode = orgcode
        .or_else(|| ctx.config.last_orgcode.clone())
        .unwrap_or_default();

    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password(format!(
            "{}: ",
            ctx.localizer.translate(keys::LOGIN_FORM_PASSWORD)
        ))?,
    };

    let mut request = LoginRequest::new(usercode.as_str(), password)
        .with_orgcode(orgcode.as_str())
        .remember_me(remember);
    if let Some(date) = basedate {
        request = request.with_basedate(date);
    }

    let user = ctx.session.login(&request).await?;
    println!("Signed in as {}", user.display_name());
    if !remember {
        println!("Credential kept for this process only; pass --remember to stay signed in");
    }

    if let Err(e) = Config::remember_sign_in(&usercode, &orgcode) {
        tracing::warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn whoami(ctx: &PortalContext) -> Result<()> {
    match ctx.session.current_user().await? {
        Some(user) => {
            println!("{}", user.display_name());
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn navigate(ctx: &PortalContext, location: &str) -> Result<()> {
    restore_session(ctx).await?;

    let outcome = ctx
        .navigate(location)
        .ok_or_else(|| anyhow::anyhow!("No route for {}", location))?;

    let title = outcome
        .route
        .title(&ctx.localizer)
        .unwrap_or_else(|| outcome.route.name.to_string());
    if outcome.redirected {
        println!("{} -> {} ({})", location, outcome.location, title);
    } else {
        println!("{} ({})", outcome.location, title);
    }
    Ok(())
}

fn language(ctx: &PortalContext, code: Option<String>) -> Result<()> {
    if let Some(code) = code {
        ctx.localizer.set_language(&code)?;
    }
    let current = ctx.localizer.language();
    for lang in ctx.localizer.supported() {
        let marker = if *lang == current { "*" } else { " " };
        println!("{} {} {}", marker, lang.code(), lang.native_name());
    }
    Ok(())
}

async fn status(ctx: &PortalContext) -> Result<()> {
    let (user, menu, orgs) = futures::join!(
        ctx.session.current_user(),
        ctx.api.menu_items(ctx.localizer.language()),
        ctx.api.orgs()
    );

    let state = ctx.session.state();
    match (state, user) {
        (SessionState::Authenticated, Ok(Some(user))) => println!("Signed in as {}", user.display_name()),
        (_, Err(e)) => println!("Not signed in ({})", e),
        _ => println!("Not signed in"),
    }
    println!("Language: {}", ctx.localizer.language().native_name());

    if let Ok(menu) = menu {
        println!("Menu:");
        print_menu(&menu);
    }
    if let Ok(orgs) = orgs {
        println!("Organizations: {}", orgs.len());
    }
    Ok(())
}

/// Resolve a stored credential into a profile so the guard sees it.
async fn restore_session(ctx: &PortalContext) -> Result<()> {
    if ctx.credentials.has_credential() && !ctx.session.is_authenticated() {
        ctx.session.current_user().await?;
    }
    Ok(())
}

fn print_menu(menu: &[MenuItem]) {
    for (depth, item) in menu.iter().flat_map(|m| m.walk()) {
        let indent = "  ".repeat(depth);
        match item.path {
            Some(ref path) => println!("{}{} ({})", indent, item.text, path),
            None => println!("{}{}", indent, item.text),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
