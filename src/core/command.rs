//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Draft editing
    Set(String),
    Clear,

    // Contract interaction
    Send,
    Refresh,
    Reset,

    // Connection
    Endpoint(Option<usize>),
    Chain,

    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim().to_string());

    match cmd.to_lowercase().as_str() {
        // Draft
        "set" | "greet" => Command::Set(args.unwrap_or_default()),
        "clear" | "clr" => Command::Clear,

        // Contract
        "send" | "write" | "submit" => Command::Send,
        "refresh" | "refetch" | "r" => Command::Refresh,
        "reset" => Command::Reset,

        // Connection
        "endpoint" | "ep" => match args {
            None => Command::Endpoint(None),
            Some(raw) => match raw.parse() {
                Ok(index) => Command::Endpoint(Some(index)),
                Err(_) => Command::Unknown(input.to_string()),
            },
        },
        "chain" => Command::Chain,

        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}
