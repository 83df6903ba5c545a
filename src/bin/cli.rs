use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ago_dashboard::client::jsonrpc::JsonRpcClient;
use ago_dashboard::client::CommandClient;
use ago_dashboard::error::AppError;
use ago_dashboard::model::{Device, DeviceId, Inventory, ScenarioMap, Step};
use ago_dashboard::panels::{ScenarioPanel, VariablesPanel};
use ago_dashboard::settings::{self, DashboardSettings};
use ago_dashboard::state::DashboardState;
use ago_dashboard::{demo, describe, paths, storage};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ago-dashboard-cli", about = "agocontrol dashboard headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the agorpc bridge (overrides settings.json)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Use the built-in demo controller instead of the network
    #[arg(long, global = true)]
    offline: bool,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scenario management
    Scenarios {
        #[command(subcommand)]
        action: ScenarioAction,
    },
    /// Global variable management
    Variables {
        #[command(subcommand)]
        action: VariableAction,
    },
    /// Human-readable description of the controller inventory
    Inventory,
    /// Show the effective settings
    Settings {
        /// Write them back to settings.json
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum ScenarioAction {
    /// List all scenarios
    List,
    /// Show the steps of a scenario (by id or name)
    Show { scenario: String },
    /// Create a scenario from steps such as "Lamp:on", "Ceiling:setlevel:level=40" or "pause:30"
    Create {
        name: String,
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Delete a scenario
    Delete { scenario: String },
    /// Run a scenario
    Run { scenario: String },
    /// Write a scenario's steps to a JSON file
    Export { scenario: String, file: PathBuf },
    /// Create a scenario from a JSON step file
    Import { name: String, file: PathBuf },
    /// Rename a scenario
    Rename { scenario: String, name: String },
}

#[derive(Subcommand)]
enum VariableAction {
    /// List variables
    List,
    /// Set (or create) a variable
    Set { name: String, value: String },
    /// Flip a true/false variable
    Toggle { name: String },
    /// Delete a variable
    Delete { name: String },
}

// ── Setup ────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn effective_settings(cli: &Cli) -> (PathBuf, DashboardSettings) {
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let mut settings = settings::load_settings(&config_dir).unwrap_or_default();
    if let Some(url) = &cli.url {
        settings.rpc_url.clone_from(url);
    }
    (config_dir, settings)
}

fn connect(cli: &Cli, settings: &DashboardSettings) -> Arc<dyn CommandClient> {
    if cli.offline {
        eprintln!("[ago] Offline: using demo controller");
        return Arc::new(demo::demo_controller());
    }
    match JsonRpcClient::from_settings(settings) {
        Ok(client) => {
            eprintln!("[ago] Controller: {}", client.endpoint());
            Arc::new(client)
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &AppError) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// ── Lookups ──────────────────────────────────────────────────────

/// Match a scenario by id, then by name (case-insensitive).
fn find_scenario(panel: &ScenarioPanel, key: &str) -> DeviceId {
    let scenarios = panel.scenarios();
    scenarios
        .iter()
        .find(|d| d.id.as_str() == key)
        .or_else(|| scenarios.iter().find(|d| d.name.eq_ignore_ascii_case(key)))
        .map(|d| d.id.clone())
        .unwrap_or_else(|| {
            fail(&AppError::NotFound {
                what: format!("Scenario '{key}'"),
            })
        })
}

fn find_device<'a>(inventory: &'a Inventory, key: &str) -> Option<&'a Device> {
    let devices = inventory.devices();
    devices
        .iter()
        .find(|d| d.id.as_str() == key)
        .or_else(|| devices.iter().find(|d| d.name.eq_ignore_ascii_case(key)))
}

/// Parse "pause:SECS" or "DEVICE:COMMAND[:k=v,k=v]".
fn parse_step(inventory: &Inventory, text: &str) -> Result<Step, AppError> {
    let mut parts = text.splitn(3, ':');
    let head = parts.next().unwrap_or_default();
    let second = parts.next().ok_or_else(|| AppError::ValidationError {
        message: format!("Step '{text}' needs DEVICE:COMMAND or pause:SECS"),
    })?;

    if head.eq_ignore_ascii_case("pause") {
        return Ok(Step::pause(second));
    }
    let device = find_device(inventory, head).ok_or_else(|| AppError::NotFound {
        what: format!("Device '{head}'"),
    })?;
    let mut step = Step::action(device.id.as_str(), second);
    if let Some(params) = parts.next() {
        for pair in params.split(',').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| AppError::ValidationError {
                message: format!("Parameter '{pair}' must be key=value"),
            })?;
            step = step.with_param(key.trim(), value.trim());
        }
    }
    Ok(step)
}

/// Load steps into the create form. Every step must match the inventory.
fn fill_draft(panel: &ScenarioPanel, map: &ScenarioMap) {
    let unmatched = panel.with_draft(|builder, inv| builder.load(inv, map));
    if let Some(pos) = unmatched.first() {
        fail(&AppError::ValidationError {
            message: format!("Step {pos} does not match any device command"),
        });
    }
}

// ── Commands ─────────────────────────────────────────────────────

async fn run_scenarios(panel: &ScenarioPanel, action: ScenarioAction, json: bool) -> Result<(), AppError> {
    match action {
        ScenarioAction::List => {
            let scenarios = panel.scenarios();
            if json {
                print_json(&scenarios);
            } else {
                for s in &scenarios {
                    println!("{}  {}", s.id, s.display_name());
                }
            }
        }
        ScenarioAction::Show { scenario } => {
            let id = find_scenario(panel, &scenario);
            let map = panel.fetch_steps(&id).await?;
            if json {
                print_json(&map);
            } else {
                let text = panel
                    .state()
                    .with_inventory(|inv| describe::describe_scenario(inv, &id, &map));
                println!("{text}");
            }
        }
        ScenarioAction::Create { name, steps } => {
            let parsed = panel.state().with_inventory(|inv| {
                steps
                    .iter()
                    .map(|s| parse_step(inv, s))
                    .collect::<Result<Vec<_>, _>>()
            })?;
            fill_draft(panel, &ScenarioMap::from_steps(&parsed));
            panel.set_name(&name);
            let id = panel.create().await?;
            println!("{id}");
        }
        ScenarioAction::Import { name, file } => {
            let map: ScenarioMap = storage::read_json(&file)?;
            fill_draft(panel, &map);
            panel.set_name(&name);
            let id = panel.create().await?;
            println!("{id}");
        }
        ScenarioAction::Export { scenario, file } => {
            let id = find_scenario(panel, &scenario);
            let map = panel.fetch_steps(&id).await?;
            storage::write_json(&file, &map)?;
            eprintln!("[ago] Wrote {} steps to {}", map.len(), file.display());
        }
        ScenarioAction::Delete { scenario } => {
            let id = find_scenario(panel, &scenario);
            panel.delete(&id).await?;
        }
        ScenarioAction::Run { scenario } => {
            let id = find_scenario(panel, &scenario);
            panel.run(&id).await;
        }
        ScenarioAction::Rename { scenario, name } => {
            let id = find_scenario(panel, &scenario);
            panel.rename(&id, &name).await?;
        }
    }
    Ok(())
}

async fn run_variables(panel: &VariablesPanel, action: VariableAction, json: bool) -> Result<(), AppError> {
    match action {
        VariableAction::List => {
            let rows = panel.variables();
            if json {
                print_json(&rows);
            } else {
                for row in &rows {
                    println!("{} = {}", row.name, row.value);
                }
            }
        }
        VariableAction::Set { name, value } => {
            if !panel.set(&name, &value).await? {
                eprintln!("[ago] {name} unchanged");
            }
        }
        VariableAction::Toggle { name } => match panel.toggle(&name).await? {
            Some(value) => println!("{name} = {value}"),
            None => eprintln!("[ago] {name} is not a true/false variable"),
        },
        VariableAction::Delete { name } => panel.delete(&name).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let (config_dir, settings) = effective_settings(&cli);

    if let Commands::Settings { save } = cli.command {
        if save {
            if let Err(e) = settings::save_settings(&config_dir, &settings) {
                fail(&AppError::from(e));
            }
            eprintln!("[ago] Saved {}", paths::settings_path(&config_dir).display());
        }
        print_json(&settings);
        return;
    }

    let client = connect(&cli, &settings);
    let state = match DashboardState::load(client.as_ref()).await {
        Ok(state) => Arc::new(state),
        Err(e) => fail(&e),
    };

    let result = match cli.command {
        Commands::Scenarios { action } => {
            let panel = ScenarioPanel::new(client, state);
            run_scenarios(&panel, action, cli.json).await
        }
        Commands::Variables { action } => {
            let panel = VariablesPanel::new(client, state);
            run_variables(&panel, action, cli.json).await
        }
        Commands::Inventory => {
            state.with_inventory(|inv| {
                if cli.json {
                    print_json(&inv.to_value());
                } else {
                    println!("{}", describe::describe_inventory(inv));
                }
            });
            Ok(())
        }
        Commands::Settings { .. } => Ok(()),
    };

    if let Err(e) = result {
        fail(&e);
    }
}
