//! Console front-end for the settings panel

use std::io::Write;

use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{
    controller::ControllerHandle,
    popup::{CountdownDisplay, SettingsPanel},
};

/// A line typed into the console panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Enable,
    Disable,
    Interval(String),
    Save,
    Show,
    Help,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match words.next()? {
            "on" => Self::Enable,
            "off" => Self::Disable,
            "interval" => Self::Interval(words.next().unwrap_or_default().to_string()),
            "save" => Self::Save,
            "show" => Self::Show,
            "help" => Self::Help,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}

const HELP: &str = "commands: on | off | interval <minutes> | save | show | help";

fn render(display: &CountdownDisplay) {
    print!("\r[{}] ", display.text);
    let _ = std::io::stdout().flush();
}

fn show_fields(panel: &SettingsPanel) {
    println!(
        "\nauto-save {} every {} min, next save in {}",
        if panel.enabled() { "on" } else { "off" },
        panel.interval_minutes(),
        panel.display().text
    );
}

/// Drive a settings panel from stdin until input ends
pub async fn console_popup_task(controller: ControllerHandle) {
    let (mut panel, mut updates) = match SettingsPanel::open(controller).await {
        Ok(opened) => opened,
        Err(e) => {
            warn!("Failed to open settings panel: {}", e);
            return;
        }
    };

    info!("Settings panel open, type `help` for commands");
    show_fields(&panel);
    let mut lines = BufReader::new(stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        break;
                    }
                };
                let Some(command) = ConsoleCommand::parse(&line) else {
                    continue;
                };

                match command {
                    ConsoleCommand::Enable => panel.set_enabled(true),
                    ConsoleCommand::Disable => panel.set_enabled(false),
                    ConsoleCommand::Interval(text) => {
                        if let Err(e) = panel.set_interval_text(&text) {
                            println!("\n{}", e);
                        }
                    }
                    ConsoleCommand::Save => match panel.save().await {
                        Ok(_) => println!("\nsettings saved"),
                        Err(e) => println!("\nfailed to save settings: {}", e),
                    },
                    ConsoleCommand::Show => show_fields(&panel),
                    ConsoleCommand::Help => println!("\n{}", HELP),
                    ConsoleCommand::Unknown(word) => {
                        println!("\nunknown command `{}`; {}", word, HELP)
                    }
                }
            }
            update = updates.next() => match update {
                Some(update) => render(panel.on_timer_update(update)),
                None => break,
            },
        }
    }

    info!("Settings panel closed");
}
