use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod api;
mod config;
mod dashboard;
mod error;
mod forms;
mod logging;
mod models;
mod report;
mod risk;
mod roster;
mod router;
mod session;
mod trend;
mod view;

use api::{ApiClient, StudentApi};
use config::AppConfig;
use dashboard::DashboardState;
use error::DashboardError;
use models::StatusCategory;
use router::{Navigator, Route};
use session::{AuthContext, SessionStore};

#[derive(Parser)]
#[command(name = "risk-dashboard")]
#[command(about = "Student risk dashboard for lecturers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RISK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a lecturer account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the searchable, filterable student roster
    Roster {
        #[arg(long, default_value = "")]
        search: String,
        /// at-risk, newly-at-risk, improving or on-track
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "module")]
        modules: Vec<String>,
        /// column[:asc|desc]; the first flag is the primary key
        #[arg(long = "sort")]
        sort: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show one student's risk, trend and grade history
    Student { id: i64 },
    /// Manage your modules
    Modules {
        #[command(subcommand)]
        action: ModuleAction,
    },
    /// Upload a CSV of assessment scores
    Upload {
        #[arg(long = "module")]
        module: Option<String>,
        /// Teaching week, 1 to 12
        #[arg(long, default_value_t = 3)]
        week: u32,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Generate a markdown roster report
    Report {
        #[arg(long, default_value = "risk-report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ModuleAction {
    List,
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        assessments: u32,
    },
    Update {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        assessments: u32,
    },
    Delete {
        #[arg(long)]
        code: String,
    },
}

impl Commands {
    fn route(&self) -> Route {
        match self {
            Commands::Login { .. } => Route::Login,
            Commands::Register { .. } => Route::Register,
            Commands::Logout | Commands::Roster { .. } | Commands::Report { .. } => {
                Route::Dashboard
            }
            Commands::Student { id } => Route::Student(*id),
            Commands::Modules { .. } => Route::Modules,
            Commands::Upload { .. } => Route::Submit,
        }
    }
}

/// Clears the stored session when the server rejected the token.
fn expire_session(
    store: &mut SessionStore,
    navigator: &mut Navigator,
    error: DashboardError,
) -> anyhow::Result<()> {
    if error.is_session_expired() {
        store.clear()?;
        redirect_to_login(navigator);
        println!("Session expired. Please log in again (redirected to {}).", Route::Login);
        return Ok(());
    }
    Err(error.into())
}

/// The dashboard state may already have redirected; record the event once.
fn redirect_to_login(navigator: &mut Navigator) {
    if navigator.current() != Some(&Route::Login) {
        navigator.navigate(Route::Login);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let client = ApiClient::new(&config).context("failed to build API client")?;
    let mut store = SessionStore::default_location()?;
    let mut navigator = Navigator::default();

    let auth = store.auth_context()?;
    let requested = cli.command.route();
    let landed = router::guard(requested.clone(), auth.as_ref());
    if landed != requested && !matches!(cli.command, Commands::Logout) {
        navigator.navigate(landed.clone());
        match landed {
            Route::Login => println!("Please log in first (redirected to {landed})."),
            _ => println!(
                "Already logged in as {} (redirected to {landed}).",
                auth.as_ref().map(|a| a.email.as_str()).unwrap_or_default()
            ),
        }
        return Ok(());
    }

    match cli.command {
        Commands::Login { email, password } => {
            let token = client.login(&email, &password).await?;
            store.save(&token, &email)?;
            navigator.navigate(Route::Dashboard);
            println!("Login successful! Session stored in {}.", store.path().display());
        }
        Commands::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let registration = forms::registration(&name, &email, &password, &confirm)?;
            client.register(&registration).await?;
            navigator.navigate(Route::Login);
            println!("Registration successful! You can now log in.");
        }
        Commands::Logout => {
            store.clear()?;
            navigator.navigate(Route::Login);
            println!("Logged out.");
        }
        Commands::Roster {
            search,
            status,
            modules,
            sort,
            page,
            page_size,
        } => {
            let auth = authenticated(auth)?;
            let mut state = DashboardState::default();
            state.begin_session(&auth);
            state.view.search_term = search;
            if let Some(value) = status {
                let category = StatusCategory::parse(&value)
                    .ok_or_else(|| DashboardError::validation(format!("unknown status '{value}'")))?;
                state.view.toggle_status(category);
            }
            state.view.module_filter = modules.into_iter().collect();
            for key in view::parse_sort_keys(&sort).map_err(DashboardError::validation)? {
                state.view.set_sort(key.column, key.direction, key.priority);
            }

            state.refresh(&client, &auth, &mut navigator).await;
            if state.session_expired() {
                return expire_session(&mut store, &mut navigator, DashboardError::SessionExpired);
            }
            for notice in state.notices() {
                eprintln!("{notice}");
            }

            let visible = state.visible();
            let page_size = page_size.unwrap_or(config.page_size);
            println!("{}", report::render_aggregate(&state.aggregate()));
            if !state.module_options().is_empty() {
                println!("Modules: {}", report::render_module_options(state.module_options()));
            }
            println!();
            print!("{}", report::render_roster_table(view::paginate(&visible, page, page_size)));
            println!(
                "Page {} of {} ({} of {} rows)",
                page,
                view::page_count(visible.len(), page_size),
                visible.len(),
                state.roster().len()
            );
        }
        Commands::Student { id } => {
            let auth = authenticated(auth)?;
            match client.fetch_student(&auth, id).await {
                Ok(detail) => print!("{}", report::render_student_detail(&detail)),
                Err(error) => return expire_session(&mut store, &mut navigator, error),
            }
        }
        Commands::Modules { action } => {
            let auth = authenticated(auth)?;
            let result = run_module_action(&client, &auth, action).await;
            if let Err(error) = result {
                return expire_session(&mut store, &mut navigator, error);
            }
        }
        Commands::Upload { module, week, file } => {
            let upload = forms::grade_upload(module.as_deref(), week, file.as_deref())?;
            let module_code = upload.module_code.clone();
            match client.upload_grades(auth.as_ref(), upload).await {
                Ok(()) => println!("Grades submitted successfully for {module_code}!"),
                Err(error) => return expire_session(&mut store, &mut navigator, error),
            }
        }
        Commands::Report { out, limit } => {
            let auth = authenticated(auth)?;
            let records = match client.fetch_students(&auth).await {
                Ok(records) => records,
                Err(error) => return expire_session(&mut store, &mut navigator, error),
            };
            let rows = roster::project(&records);
            let report = report::build_report(&auth.email, chrono::Utc::now(), &rows, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    tracing::debug!(history = ?navigator.history(), "navigation");
    Ok(())
}

fn authenticated(auth: Option<AuthContext>) -> Result<AuthContext, DashboardError> {
    auth.ok_or(DashboardError::SessionExpired)
}

async fn run_module_action(
    client: &ApiClient,
    auth: &AuthContext,
    action: ModuleAction,
) -> Result<(), DashboardError> {
    match action {
        ModuleAction::List => {
            let modules = client.fetch_modules(auth).await?;
            print!("{}", report::render_modules(&modules));
        }
        ModuleAction::Create {
            code,
            name,
            assessments,
        } => {
            let module = forms::module(&code, &name, assessments)?;
            client.create_module(auth, &module).await?;
            println!("Module created");
        }
        ModuleAction::Update {
            code,
            name,
            assessments,
        } => {
            let module = forms::module(&code, &name, assessments)?;
            client.update_module(auth, &module).await?;
            println!("Module updated");
        }
        ModuleAction::Delete { code } => {
            let code = code.trim();
            if code.is_empty() {
                return Err(DashboardError::validation("Module Code is required"));
            }
            client.delete_module(auth, code).await?;
            println!("Module deleted");
        }
    }
    Ok(())
}
