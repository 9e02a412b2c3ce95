use std::io::{self, BufRead};

use ansi_term::{Colour, Style};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::report::{
    channel::{ControlError, MessageChannel, MessageHandle},
    pages::Navigation,
};

const TITLE_COLOUR: Colour = Colour::RGB(0x61, 0xC7, 0xC3);
const CONTROLS_HINT: &str = "[f]irst [p]revious [n]ext [l]ast [q]uit";

/// Shows pages on stdout and reads navigation from stdin.
pub struct TerminalChannel;

#[async_trait]
impl MessageChannel for TerminalChannel {
    type Message = TerminalMessage;

    async fn send_message(&self, content: &str) -> Result<TerminalMessage> {
        print_page(content);
        Ok(TerminalMessage {
            input: spawn_stdin_reader(),
        })
    }
}

pub struct TerminalMessage {
    input: mpsc::Receiver<Navigation>,
}

#[async_trait]
impl MessageHandle for TerminalMessage {
    async fn edit(&self, content: &str) -> Result<()> {
        println!();
        print_page(content);
        Ok(())
    }

    async fn attach_navigation_controls(&self) -> Result<()> {
        println!("{}", Style::new().dimmed().paint(CONTROLS_HINT));
        Ok(())
    }

    async fn clear_navigation_controls(&self) -> Result<(), ControlError> {
        println!("{}", Style::new().dimmed().paint("(navigation closed)"));
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        debug!("Terminal output can't be deleted");
        Ok(())
    }

    async fn next_navigation(&mut self) -> Option<Navigation> {
        self.input.recv().await
    }
}

/// Stdin is read on a dedicated thread, a blocked read there doesn't hold up the runtime.
fn spawn_stdin_reader() -> mpsc::Receiver<Navigation> {
    let (sender, receiver) = mpsc::channel(4);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_navigation(&line) {
                Some(navigation) => {
                    if sender.blocking_send(navigation).is_err() {
                        break;
                    }
                }
                None => println!("{}", Style::new().dimmed().paint(CONTROLS_HINT)),
            }
        }
    });
    receiver
}

fn parse_navigation(line: &str) -> Option<Navigation> {
    match line.trim() {
        "f" | "first" | "<<" => Some(Navigation::First),
        "p" | "prev" | "previous" | "<" => Some(Navigation::Previous),
        "n" | "next" | ">" | "" => Some(Navigation::Next),
        "l" | "last" | ">>" => Some(Navigation::Last),
        "q" | "quit" | "stop" => Some(Navigation::Stop),
        _ => None,
    }
}

fn print_page(content: &str) {
    let mut lines = content.lines();
    if let Some(title) = lines.next() {
        println!("{}", TITLE_COLOUR.bold().paint(title));
    }
    for line in lines {
        println!("{}", emphasize(line));
    }
}

/// Renders a leading `**name**` in bold.
fn emphasize(line: &str) -> String {
    let Some((name, rest)) = line
        .strip_prefix("**")
        .and_then(|v| v.split_once("**"))
    else {
        return line.to_string();
    };
    format!("{}{rest}", Style::new().bold().paint(name))
}
