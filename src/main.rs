mod cli;
mod config;
mod error;
mod handlers;
mod input;
mod logging;
mod models;
mod reminders;
mod todo;
mod toolbox;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::Config;
use error::report;
use handlers::clock::SystemClock;
use handlers::password;
use models::Feature;
use reminders::{spawn_poller, ReminderStore};
use std::sync::Arc;
use std::time::Duration;
use todo::TodoList;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use toolbox::Toolbox;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = Config::default_path();

    if matches!(cli.command, None | Some(Commands::Tui)) {
        let log_path = logging::init_for_tui()?;
        log::info!("Starting TUI, logging to {}", log_path.display());
    } else {
        logging::init_for_cli();
    }

    let mut config = Config::load(&config_path)?;
    config.apply_env();
    log::debug!("Loaded config from {}", config_path.display());

    let toolbox = Toolbox::new(config, ReminderStore::new(), Arc::new(SystemClock))?;

    match cli.command {
        Some(Commands::Time) => run_feature(&toolbox, Feature::TimeDate, "")?,
        Some(Commands::Weather { city }) => run_feature(&toolbox, Feature::Weather, &city.join(" "))?,
        Some(Commands::Wiki { query }) => run_feature(&toolbox, Feature::Wikipedia, &query.join(" "))?,
        Some(Commands::Password { password }) => run_feature(&toolbox, Feature::Password, &password)?,
        Some(Commands::Generate { length }) => {
            let length = length.map(usize::from).unwrap_or(toolbox.config().password_length);
            println!("{}", password::generate(length));
        }
        Some(Commands::Calc { expression }) => {
            run_feature(&toolbox, Feature::Calculator, &expression.join(" "))?
        }
        Some(Commands::Convert { value }) => run_feature(&toolbox, Feature::Converter, &value)?,
        Some(Commands::Text { text }) => run_feature(&toolbox, Feature::TextUtils, &text.join(" "))?,
        Some(Commands::Remind { reminder }) => {
            run_feature(&toolbox, Feature::Reminder, &reminder)?;
            if toolbox.reminders().pending() == 0 {
                return Ok(());
            }
            wait_for_reminder(&toolbox)?;
        }
        Some(Commands::TodoList) => run_feature(&toolbox, Feature::TodoList, "")?,
        Some(Commands::TodoAdd { text }) => {
            let mut list = match TodoList::open(toolbox.todo_store().clone()) {
                Ok(list) => list,
                Err(e) => {
                    println!("{}", report(&e));
                    return Ok(());
                }
            };
            match list.add(&text.join(" ")) {
                Ok(task) => println!("Task added: {}", task.text),
                Err(e) => println!("{}", report(&e)),
            }
        }
        Some(Commands::TodoToggle { task }) => {
            let mut list = match TodoList::open(toolbox.todo_store().clone()) {
                Ok(list) => list,
                Err(e) => {
                    println!("{}", report(&e));
                    return Ok(());
                }
            };
            // Numbers are 1-based positions as printed by todo-list.
            let index = match task.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Some(n - 1),
                _ => list.find(&task),
            };
            let Some(index) = index else {
                println!("No such task");
                return Ok(());
            };
            match list.toggle(index) {
                Ok(done) => println!(
                    "Task updated: [{}] {}",
                    if done { 'x' } else { ' ' },
                    list.tasks()[index].text
                ),
                Err(e) => println!("{}", report(&e)),
            }
        }

        Some(Commands::Set { key, value }) => {
            let mut file_config = Config::load(&config_path)?;
            file_config.set(&key, &value)?;
            file_config.save(&config_path)?;
            println!("Set {} = {}", key, file_config.get(&key)?);
        }

        Some(Commands::Get { key }) => {
            let file_config = Config::load(&config_path)?;
            println!("{}", file_config.get(&key)?);
        }

        Some(Commands::ConfigList) => {
            let file_config = Config::load(&config_path)?;
            println!("Config file: {}", config_path.display());
            for (key, value) in file_config.entries() {
                println!("  {:<20} {}", key, value);
            }
        }

        Some(Commands::ConfigDelete { key }) => {
            let mut file_config = Config::load(&config_path)?;
            file_config.unset(&key)?;
            file_config.save(&config_path)?;
            println!("Reset {} to its default", key);
        }

        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "utilbot", &mut std::io::stdout());
        }
        Some(Commands::Tui) | None => {
            // Default behavior: launch TUI
            run_tui(toolbox)?;
        }
    }

    Ok(())
}

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?)
}

fn run_feature(toolbox: &Toolbox, feature: Feature, input: &str) -> Result<()> {
    let rt = runtime()?;
    for line in rt.block_on(toolbox.run(feature, input)) {
        println!("{}", line);
    }
    Ok(())
}

/// Block until the scheduled reminder fires.
fn wait_for_reminder(toolbox: &Toolbox) -> Result<()> {
    let interval = Duration::from_secs(toolbox.config().poll_interval_secs);
    if let Some(next) = toolbox.reminders().snapshot().iter().find(|r| !r.fired) {
        println!("Waiting until {} (Ctrl+C to cancel)...", next.at);
    }

    let rt = runtime()?;
    rt.block_on(async {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = spawn_poller(toolbox.reminders().clone(), toolbox.clock(), interval, tx);
        if let Some(notification) = rx.recv().await {
            println!("{}", notification);
        }
        poller.abort();
    });
    Ok(())
}
