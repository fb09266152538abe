//! Line-oriented terminal front end.
//!
//! Responsibilities:
//! - drive the login prompt until a session becomes active
//! - render inbound and locally typed messages
//! - interpret `/connect`, `/peers`, `/quit` and plain chat lines

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::Broadcaster;
use crate::net::encode;
use crate::peers::PeerRegistry;
use crate::server::MessageSink;
use crate::session::{Active, Authenticating};
use crate::types::{Message, PeerAddress};
use crate::utils::Prompter;

pub const HELP: &[&str] = &[
    "Commands:",
    "  /connect <ip:port>   - add a peer",
    "  /peers               - list peers",
    "  /quit                - exit",
];

/// Run the login prompt until someone logs in. Returns `None` if input runs
/// out first.
pub fn authenticate<P, W>(
    mut auth: Authenticating,
    prompter: &mut P,
    out: &mut W,
) -> io::Result<Option<Active>>
where
    P: Prompter,
    W: Write,
{
    loop {
        let Some(choice) = prompter.line("Login (l) or register (r)? ")? else {
            return Ok(None);
        };
        let Some(username) = prompter.line("Username: ")? else {
            return Ok(None);
        };
        let Some(password) = prompter.secret("Password: ")? else {
            return Ok(None);
        };

        match choice.trim().to_lowercase().as_str() {
            "r" => match auth.register(username.trim(), &password) {
                Ok(()) => writeln!(out, "{}", "User registered. Please log in.".green())?,
                Err(err) => writeln!(out, "{}", format!("Registration failed: {err}").red())?,
            },
            "l" => match auth.login(username.trim(), &password) {
                Ok(active) => {
                    writeln!(out, "{}", "Login successful!".green())?;
                    return Ok(Some(active));
                }
                Err(back) => {
                    writeln!(out, "{}", "Login failed: unknown user or wrong password".red())?;
                    auth = back;
                }
            },
            _ => writeln!(out, "{}", "Please enter 'l' or 'r'.".yellow())?,
        }
    }
}

/// One interactive input line, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(PeerAddress),
    /// `/connect` without an address.
    ConnectUsage,
    Peers,
    Quit,
    Say(String),
    /// Blank line.
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Nothing,
            "/quit" => Command::Quit,
            "/peers" => Command::Peers,
            "/connect" => Command::ConnectUsage,
            _ => match line.strip_prefix("/connect ") {
                Some(addr) => Command::Connect(addr.trim().to_string()),
                None => Command::Say(line.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Prints inbound messages to stdout.
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn deliver(&self, message: Message) {
        println!("{}", render_inbound(&message));
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

pub fn render_inbound(message: &Message) -> String {
    format!(
        "{} {} {}",
        timestamp().dark_grey(),
        format!("[{}]", message.sender()).green(),
        message.content()
    )
}

pub fn render_local(message: &Message) -> String {
    format!(
        "{} {} {}",
        timestamp().dark_grey(),
        format!("[{}]", message.sender()).blue(),
        message.content()
    )
}

/// The active chat: the logged-in user plus the outbound machinery.
pub struct Chat {
    user: Active,
    peers: Arc<PeerRegistry>,
    broadcaster: Broadcaster,
}

impl Chat {
    pub fn new(user: Active, peers: Arc<PeerRegistry>, broadcaster: Broadcaster) -> Self {
        Self {
            user,
            peers,
            broadcaster,
        }
    }

    pub fn user(&self) -> &Active {
        &self.user
    }

    /// Act on one input line, writing any feedback to `out`.
    ///
    /// Chat lines are echoed to `out` before the broadcast is dispatched;
    /// the broadcast itself runs in the background. A line that does not
    /// fit in one wire frame is refused here and neither echoed nor sent.
    pub fn handle<W: Write>(&self, line: &str, out: &mut W) -> io::Result<Flow> {
        match Command::parse(line) {
            Command::Nothing => {}
            Command::Quit => {
                writeln!(out, "{}", "Bye.".yellow())?;
                return Ok(Flow::Quit);
            }
            Command::Peers => {
                let peers = self.peers.snapshot();
                if peers.is_empty() {
                    writeln!(out, "{}", "(no peers)".yellow())?;
                }
                for peer in peers {
                    writeln!(out, "{}", format!("• {peer}").white())?;
                }
            }
            Command::ConnectUsage => {
                writeln!(out, "{}", "Usage: /connect <ip:port>".yellow())?;
            }
            Command::Connect(addr) => {
                writeln!(out, "{}", format!("Connected to {addr}").green())?;
                self.peers.add(addr);
            }
            Command::Say(text) => {
                let message = self.user.compose(text);
                if let Err(err) = encode(&message) {
                    writeln!(out, "{}", format!("Message not sent: {err}").red())?;
                    return Ok(Flow::Continue);
                }
                writeln!(out, "{}", render_local(&message))?;
                self.broadcaster.broadcast(message);
            }
        }
        Ok(Flow::Continue)
    }

    /// Read stdin line by line until `/quit` or end of input.
    pub async fn run(&self) -> io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let mut stdout = io::stdout();
            if self.handle(&line, &mut stdout)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }
}
