use crate::config::Config;
use crate::error::report;
use crate::handlers::clock::{self, Clock};
use crate::handlers::weather::WeatherClient;
use crate::handlers::wiki::WikiClient;
use crate::handlers::{calculator, converter, password, text};
use crate::models::Feature;
use crate::reminders::{parse_reminder, ReminderStore};
use crate::todo::TodoStore;
use anyhow::Result;
use std::sync::Arc;

/// Everything the buttons need. Each call to [`Toolbox::run`] maps one input
/// to the lines appended to the log; errors never escape it.
pub struct Toolbox {
    config: Config,
    weather: WeatherClient,
    wiki: WikiClient,
    reminders: ReminderStore,
    todo_store: TodoStore,
    clock: Arc<dyn Clock>,
}

impl Toolbox {
    pub fn new(config: Config, reminders: ReminderStore, clock: Arc<dyn Clock>) -> Result<Self> {
        let weather = WeatherClient::new(&config)?;
        let wiki = WikiClient::new(&config)?;
        let todo_store = TodoStore::new(config.todo_path.clone());
        Ok(Self {
            config,
            weather,
            wiki,
            reminders,
            todo_store,
            clock,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reminders(&self) -> &ReminderStore {
        &self.reminders
    }

    pub fn todo_store(&self) -> &TodoStore {
        &self.todo_store
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub async fn run(&self, feature: Feature, input: &str) -> Vec<String> {
        log::debug!("Running {:?}", feature);
        match feature {
            Feature::TimeDate => clock::lines(self.clock.now()),
            Feature::Weather => match self.weather.current(input).await {
                Ok(weather) => vec![weather.to_string()],
                Err(e) => vec![report(&e)],
            },
            Feature::Wikipedia => match self.wiki.summary(input).await {
                Ok(summary) => vec![summary],
                Err(e) => vec![report(&e)],
            },
            Feature::Reminder => self.schedule_reminder(input),
            Feature::Password => vec![
                format!("Strength: {}", password::strength(input)),
                format!(
                    "Generated Password: {}",
                    password::generate(self.config.password_length)
                ),
            ],
            Feature::Calculator => match calculator::evaluate(input) {
                Ok(value) => vec![format!("Result: {}", value)],
                Err(e) => vec![report(&e)],
            },
            Feature::Converter => match converter::convert(input) {
                Ok(conversion) => vec![conversion.to_string()],
                Err(e) => vec![report(&e)],
            },
            Feature::TextUtils => text::analyze(input).lines(),
            Feature::TodoList => self.todo_lines(),
        }
    }

    fn schedule_reminder(&self, input: &str) -> Vec<String> {
        match parse_reminder(input) {
            Ok((at, message)) => {
                self.reminders.schedule(at, message);
                vec!["Reminder set successfully".to_string()]
            }
            Err(e) => vec![report(&e)],
        }
    }

    /// Checklist rendering of the stored list, for non-interactive use.
    fn todo_lines(&self) -> Vec<String> {
        match self.todo_store.load() {
            Ok(tasks) if tasks.is_empty() => vec!["No tasks".to_string()],
            Ok(tasks) => tasks
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. [{}] {}", i + 1, if t.done { 'x' } else { ' ' }, t.text))
                .collect(),
            Err(e) => vec![report(&e)],
        }
    }
}
