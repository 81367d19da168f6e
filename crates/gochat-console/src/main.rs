mod command;
mod config;
mod display;

use std::collections::HashMap;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use gochat_broker::Broker;
use gochat_client::{BrokerTransport, Client, ClientError, ConversationKey, Dispatcher, Update};
use gochat_types::Gender;

use crate::command::{Command, HELP};
use crate::config::ConsoleConfig;
use crate::display::update_lines;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with the view on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gochat=debug,gochat_client=debug,gochat_broker=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConsoleConfig::from_env();
    info!("GoChat console starting");

    let mut console = Console::new(Broker::new(), config.clone());
    if let Some(name) = &config.username {
        console.login(name, config.gender)?;
    }
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match console.run(Command::parse(&line)) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("! {e}"),
        }
    }

    console.shutdown();
    Ok(())
}

/// Several local clients sharing one in-process broker, one of them active.
struct Console {
    broker: Broker,
    config: ConsoleConfig,
    clients: HashMap<String, Client<BrokerTransport>>,
    active: Option<String>,
}

impl Console {
    fn new(broker: Broker, config: ConsoleConfig) -> Self {
        Self {
            broker,
            config,
            clients: HashMap::new(),
            active: None,
        }
    }

    /// Apply one command. `Ok(false)` means quit.
    fn run(&mut self, command: Command) -> anyhow::Result<bool> {
        let mut updates = Vec::new();

        match command {
            Command::Empty => return Ok(true),
            Command::Quit => return Ok(false),
            Command::Help => println!("{HELP}"),
            Command::Invalid(hint) => println!("{hint}"),

            Command::Login { name, gender } => return self.login(&name, gender).map(|()| true),

            Command::Switch(name) => {
                if !self.clients.contains_key(&name) {
                    bail!("no local client named {name}, use /login first");
                }
                self.active = Some(name);
                updates.push(Update::Conversation);
            }

            Command::Select(name) => {
                updates.push(self.active_client()?.select(ConversationKey::private(name))?);
            }

            Command::Public => {
                updates.push(self.active_client()?.select(ConversationKey::Public)?);
            }

            Command::Search(filter) => {
                self.active_client()?.set_filter(filter);
                updates.push(Update::Conversation);
            }

            Command::Who => {
                let client = self.active_client()?;
                let names: Vec<String> = client
                    .session()
                    .map(|s| s.roster().iter().map(|e| e.identifier.clone()).collect())
                    .unwrap_or_default();
                println!("{} Online: {}", names.len(), names.join(", "));
            }

            Command::Logout => updates.extend(self.active_client()?.disconnect()),

            Command::Send(text) => updates.extend(self.active_client()?.send(&text)?),
        }

        self.pump_all(updates);
        Ok(true)
    }

    /// Log in as `name`, reusing that client's history if it logged in before.
    fn login(&mut self, name: &str, gender: Option<Gender>) -> anyhow::Result<()> {
        let name = name.trim().to_string();
        let client = self.clients.entry(name.clone()).or_insert_with(|| {
            let transport = BrokerTransport::new(self.broker.clone());
            let dispatcher =
                Dispatcher::new(transport).with_time_format(self.config.time_format.clone());
            Client::new(dispatcher)
        });

        let result = client.connect(&name, gender);
        if matches!(result, Err(ClientError::EmptyIdentifier)) {
            self.clients.remove(&name);
        }
        result?;

        self.active = Some(name);
        self.pump_all(Vec::new());
        Ok(())
    }

    fn active_client(&mut self) -> anyhow::Result<&mut Client<BrokerTransport>> {
        let Some(name) = self.active.as_ref() else {
            bail!("not logged in, use /login <name>");
        };
        self.clients
            .get_mut(name)
            .with_context(|| format!("client {name} is gone"))
    }

    /// Drain every client's queue and print the active client's batch,
    /// `pending` first.
    fn pump_all(&mut self, mut pending: Vec<Update>) {
        for (name, client) in self.clients.iter_mut() {
            let updates = client.pump();
            if self.active.as_deref() == Some(name.as_str()) {
                pending.extend(updates);
            } else if !updates.is_empty() {
                debug!("{} applied {} background updates", name, updates.len());
            }
        }

        let Some(client) = self.active.as_ref().and_then(|name| self.clients.get(name)) else {
            return;
        };
        let Some(session) = client.session() else {
            return;
        };
        let lines = update_lines(session, client.filter(), &pending, self.config.history_limit);
        for line in lines {
            println!("{line}");
        }
    }

    fn shutdown(&mut self) {
        for client in self.clients.values_mut() {
            client.disconnect();
        }
        info!("GoChat console stopped");
    }
}
