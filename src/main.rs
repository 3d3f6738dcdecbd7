mod app;
mod config;
mod core;
mod domain;
mod infrastructure;
mod modules;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context as _, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::app::{App, InputMode, RpcEndpointOption, StatusLevel};
use crate::core::{Action, Module};
use crate::domain::greeter::{AddressTable, GreetingPanel};
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerOptions};

#[derive(Debug, Parser)]
#[command(
    name = "greeter",
    version,
    about = "Greeter: read and update a Greeter contract from the terminal"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Hex private key used to sign setGreeting; without it the node's
    /// first account sends
    #[arg(long, env = "GREETER_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Log filter, e.g. `debug` or `greeter=trace`
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_error) = match config::load() {
        Ok(config) => (config, None),
        Err(err) => (config::Config::default(), Some(err)),
    };
    init_logging(args.log_level.as_deref().or(config.log_level.as_deref()))?;
    if let Some(err) = config_error {
        warn!("using default config: {err:#}");
    }

    let signer = args
        .private_key
        .as_deref()
        .map(parse_signer)
        .transpose()?;
    let (rpc_endpoints, rpc_endpoint_options) = endpoints_from_args_and_config(&args, &config)?;
    let initial_endpoint_display = rpc_endpoints
        .first()
        .map(|endpoint| endpoint.display())
        .unwrap_or_else(|| "localhost:8545".to_string());
    info!(
        endpoints = rpc_endpoints.len(),
        signer = ?signer.as_ref().map(|s| s.address()),
        "starting"
    );

    let table = AddressTable::with_extra(config.extra_contracts());
    let mut app = App::new(GreetingPanel::new(table));
    app.ctx.rpc_endpoint = initial_endpoint_display;
    app.ctx.node_kind = "connecting".to_string();
    app.rpc_endpoints = rpc_endpoint_options;
    app.rpc_endpoint_index = 0;
    app.set_status("Connecting…", StatusLevel::Info);

    // Create the runtime bridge
    let runtime = RuntimeBridge::new(
        rpc_endpoints,
        WorkerOptions {
            poll_interval: config.poll_interval(),
            signer,
        },
    )?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("{err:#}");
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let writer = match config::log_path().and_then(|path| open_log_file(path).ok()) {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_log_file(path: PathBuf) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn parse_signer(raw: &str) -> Result<PrivateKeySigner> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex.parse::<PrivateKeySigner>()
        .context("Invalid private key")
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &mut runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            app.dispose(&mut runtime);
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(&mut app, key),
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &mut RuntimeBridge) {
    // Process runtime events
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::Connected {
                endpoint,
                chain_id,
                account,
                node_kind,
            } => app.apply_rpc_connected(endpoint, chain_id, account, node_kind),
            RuntimeEvent::Disconnected { reason } => app.apply_disconnected(reason),
            RuntimeEvent::NewBlock { number } => app.apply_new_block(number),
            RuntimeEvent::GreetingRead {
                subscription,
                block,
                result,
            } => app.apply_greeting_read(subscription, block, result),
            RuntimeEvent::GreetingEvents {
                subscription,
                events,
            } => app.apply_greeting_events(subscription, events),
            RuntimeEvent::Prepared { ticket, result } => app.apply_prepared(ticket, result),
            RuntimeEvent::Submitted { tx_hash, argument } => {
                app.apply_submitted(tx_hash, argument)
            }
            RuntimeEvent::Error { message } => app.apply_rpc_error(message),
        }
    }

    if let Some(index) = app.take_endpoint_switch_request() {
        if let Err(err) = runtime.send(RuntimeCommand::SwitchEndpoint { index }) {
            app.set_status(format!("Endpoint switch failed: {err}"), StatusLevel::Error);
        }
    }

    app.sync(runtime);
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Draft editing owns every key until it ends
    if app.greeter.is_editing() {
        let action = app.greeter.handle_key(key, &mut app.ctx);
        app.apply_action(action);
        return;
    }

    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char(':') => Action::OpenCommand(None),
        KeyCode::Char('[') => Action::CycleEndpoint(false),
        KeyCode::Char(']') => Action::CycleEndpoint(true),
        _ => app.greeter.handle_key(key, &mut app.ctx),
    };
    if action != Action::None {
        debug!(module = app.greeter.id(), ?action, "key action");
    }
    app.apply_action(action);
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn endpoints_from_args_and_config(
    args: &Args,
    config: &config::Config,
) -> Result<(Vec<ProviderConfig>, Vec<RpcEndpointOption>)> {
    use std::collections::BTreeSet;

    fn push_endpoint(
        endpoints: &mut Vec<ProviderConfig>,
        options: &mut Vec<RpcEndpointOption>,
        seen: &mut BTreeSet<String>,
        endpoint: ProviderConfig,
        name: Option<String>,
    ) {
        let display = endpoint.display();
        let key = display.to_lowercase();
        if !seen.insert(key) {
            return;
        }
        let label = name
            .filter(|value| !value.trim().is_empty())
            .map(|name| format!("{name} ({display})"))
            .unwrap_or_else(|| display.clone());
        options.push(RpcEndpointOption { label, display });
        endpoints.push(endpoint);
    }

    let mut endpoints = Vec::new();
    let mut options = Vec::new();
    let mut seen = BTreeSet::<String>::new();

    // CLI arguments take precedence
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            push_endpoint(
                &mut endpoints,
                &mut options,
                &mut seen,
                ProviderConfig::Ipc(ipc),
                Some("cli".to_string()),
            );
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    }
    if let Some(ws) = non_empty(args.ws.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::WebSocket(ws.to_string()),
            Some("cli".to_string()),
        );
    }
    if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint(rpc)),
            Some("cli".to_string()),
        );
    }

    // Config file endpoints; one transport per entry, ws preferred
    for (idx, entry) in config.endpoints.iter().enumerate() {
        let name = entry.name.clone().filter(|value| !value.trim().is_empty());
        if let Some(ws) = non_empty(entry.ws.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut options,
                &mut seen,
                ProviderConfig::WebSocket(ws.to_string()),
                name,
            );
            continue;
        }
        if let Some(rpc) = non_empty(entry.rpc.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut options,
                &mut seen,
                ProviderConfig::Http(normalize_http_endpoint(rpc)),
                name,
            );
            continue;
        }
        if let Some(ipc) = non_empty(entry.ipc.as_deref()) {
            #[cfg(unix)]
            {
                let Some(ipc_path) = expand_path(ipc) else {
                    continue;
                };
                push_endpoint(
                    &mut endpoints,
                    &mut options,
                    &mut seen,
                    ProviderConfig::Ipc(ipc_path),
                    name.or_else(|| Some(format!("ipc-{idx}"))),
                );
            }
            #[cfg(not(unix))]
            {
                let _ = (idx, ipc);
            }
        }
    }

    // Default fallback
    if endpoints.is_empty() {
        push_endpoint(
            &mut endpoints,
            &mut options,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint("localhost:8545")),
            Some("local".to_string()),
        );
    }

    Ok((endpoints, options))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg_attr(not(unix), allow(dead_code))]
fn expand_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest));
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf)
}
