//! Command router - classifies an incoming message body.

/// A command keyword that requires an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Info,
    Ask,
}

impl Keyword {
    pub fn usage(&self) -> &'static str {
        match self {
            Keyword::Info => "info [Drug Name]",
            Keyword::Ask => "ask [Your question]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Info(String),
    Ask(String),
    /// Keyword present but no argument followed it.
    Missing(Keyword),
    Unrecognized,
}

pub fn parse(body: &str) -> Command {
    if body.starts_with("start") {
        Command::Start
    } else if let Some(rest) = body.strip_prefix("info") {
        match argument(rest) {
            Some(arg) => Command::Info(arg),
            None => Command::Missing(Keyword::Info),
        }
    } else if let Some(rest) = body.strip_prefix("ask") {
        match argument(rest) {
            Some(arg) => Command::Ask(arg),
            None => Command::Missing(Keyword::Ask),
        }
    } else {
        Command::Unrecognized
    }
}

/// Everything after the delimiting space, trimmed. None when the keyword
/// has no space-delimited argument.
fn argument(rest: &str) -> Option<String> {
    let arg = rest.strip_prefix(' ')?.trim();
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}
