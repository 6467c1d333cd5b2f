#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Generate,
    Retry,
    Cancel,
    Continue,
    Save,
    Load(String),
    New,
    Delete(String),
    Stories,
    History,
    ClearHistory,
    Show,
    Theme(Option<String>),
    Help,
    Quit,
    MissingArgument(&'static str),
    Unknown(String),
}

pub const HELP_TEXT: &str = "Commands: /generate, /retry, /cancel, /continue, /save, /load <id>, /new, /delete <id>, /stories, /history, /clear-history, /show, /theme [light|dark], /help, /quit. Any other line is appended to the story.";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let command = words.next().unwrap_or(trimmed).to_string();
    let argument = words.next().map(ToOwned::to_owned);

    let parsed = match command.as_str() {
        "/generate" => SlashCommand::Generate,
        "/retry" => SlashCommand::Retry,
        "/cancel" => SlashCommand::Cancel,
        "/continue" => SlashCommand::Continue,
        "/save" => SlashCommand::Save,
        "/load" => argument
            .map(SlashCommand::Load)
            .unwrap_or(SlashCommand::MissingArgument("/load")),
        "/new" => SlashCommand::New,
        "/delete" => argument
            .map(SlashCommand::Delete)
            .unwrap_or(SlashCommand::MissingArgument("/delete")),
        "/stories" => SlashCommand::Stories,
        "/history" => SlashCommand::History,
        "/clear-history" => SlashCommand::ClearHistory,
        "/show" => SlashCommand::Show,
        "/theme" => SlashCommand::Theme(argument),
        "/help" => SlashCommand::Help,
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}
