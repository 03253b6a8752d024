//! Interactive command loop.

use std::io::{BufRead, Write};

use roster_common::Role;

use crate::api::ApiClient;
use crate::error::Result;
use crate::token::TokenMinter;
use crate::view::ViewState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Refresh,
    Status { id: i64, is_active: bool },
    Role { id: i64, role: Role },
    Delete { id: i64 },
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`; anything else
    /// either becomes a command or a usage message for the user.
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, String> {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Ok(None);
        };

        let command = match keyword {
            "list" => Command::List,
            "refresh" => Command::Refresh,
            "status" => {
                let id = parse_id(parts.next())?;
                let is_active = match parts.next() {
                    Some("on") => true,
                    Some("off") => false,
                    _ => return Err("usage: status <id> on|off".to_string()),
                };
                Command::Status { id, is_active }
            }
            "role" => {
                let id = parse_id(parts.next())?;
                let role = parts
                    .next()
                    .and_then(Role::parse)
                    .ok_or_else(|| "usage: role <id> user|admin".to_string())?;
                Command::Role { id, role }
            }
            "delete" => {
                let id = parse_id(parts.next())?;
                Command::Delete { id }
            }
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}'; type 'help'", other)),
        };

        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", keyword));
        }

        Ok(Some(command))
    }
}

fn parse_id(part: Option<&str>) -> std::result::Result<i64, String> {
    let part = part.ok_or_else(|| "missing user id".to_string())?;
    part.parse()
        .map_err(|_| "user id must be a number".to_string())
}

pub struct Console {
    api: ApiClient,
    minter: TokenMinter,
    view: ViewState,
}

impl Console {
    pub fn new(api: ApiClient, minter: TokenMinter) -> Self {
        Self {
            api,
            minter,
            view: ViewState::new(),
        }
    }

    /// Log in against the backend, then load the initial user list.
    async fn startup(&mut self) -> Result<()> {
        let token = self.minter.mint().await?;
        let user = self.api.login(&token).await?;
        println!(
            "Logged in as {} ({})",
            user.email.as_deref().unwrap_or(&user.subject),
            user.role
        );
        if !user.is_admin() {
            println!("Warning: this account is not an admin; commands will be rejected");
        }

        let token = self.minter.mint().await?;
        let users = self.api.list_users(&token).await?;
        self.view.replace(users);
        print!("{}", self.view.render());
        Ok(())
    }

    /// Execute one command. Returns false when the loop should stop.
    /// API failures are printed and leave the view untouched.
    async fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Help => print_help(),
            Command::List => print!("{}", self.view.render()),
            Command::Refresh => match self.refresh().await {
                Ok(()) => print!("{}", self.view.render()),
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Status { id, is_active } => match self.set_status(id, is_active).await {
                Ok(()) => print!("{}", self.view.render()),
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Role { id, role } => match self.set_role(id, role).await {
                Ok(()) => print!("{}", self.view.render()),
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Delete { id } => match self.delete(id).await {
                Ok(message) => {
                    println!("{}", message);
                    print!("{}", self.view.render());
                }
                Err(e) => eprintln!("Error: {}", e),
            },
        }
        true
    }

    async fn refresh(&mut self) -> Result<()> {
        let token = self.minter.mint().await?;
        let users = self.api.list_users(&token).await?;
        self.view.replace(users);
        Ok(())
    }

    async fn set_status(&mut self, id: i64, is_active: bool) -> Result<()> {
        let token = self.minter.mint().await?;
        let updated = self.api.set_status(&token, id, is_active).await?;
        self.view.apply_update(updated);
        Ok(())
    }

    async fn set_role(&mut self, id: i64, role: Role) -> Result<()> {
        let token = self.minter.mint().await?;
        let updated = self.api.set_role(&token, id, role).await?;
        self.view.apply_update(updated);
        Ok(())
    }

    async fn delete(&mut self, id: i64) -> Result<String> {
        let token = self.minter.mint().await?;
        let message = self.api.delete_user(&token, id).await?;
        self.view.remove(id);
        Ok(message)
    }

    /// Block on startup, then read commands until quit or EOF.
    pub fn run(mut self, rt: &tokio::runtime::Runtime) -> Result<()> {
        rt.block_on(self.startup())?;
        println!("Type 'help' for commands.");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut input = String::new();
        loop {
            input.clear();
            print!("> ");
            if stdout.flush().is_err() {
                break;
            }
            match stdin.lock().read_line(&mut input) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            let command = match Command::parse(&input) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    eprintln!("{}", message);
                    continue;
                }
            };

            if matches!(command, Command::Delete { .. }) && !confirm_delete(&stdin, &mut stdout) {
                println!("Cancelled");
                continue;
            }

            if !rt.block_on(self.dispatch(command)) {
                break;
            }
        }
        Ok(())
    }
}

fn confirm_delete(stdin: &std::io::Stdin, stdout: &mut std::io::Stdout) -> bool {
    print!("Are you sure you want to delete this user? This action cannot be undone. [y/N] ");
    if stdout.flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y")
}

fn print_help() {
    println!("Commands:");
    println!("  list                 show the cached user table");
    println!("  refresh              reload the user list from the server");
    println!("  status <id> on|off   activate or deactivate a user");
    println!("  role <id> user|admin change a user's role");
    println!("  delete <id>          delete a user (asks for confirmation)");
    println!("  help                 show this message");
    println!("  quit                 exit the console");
}
