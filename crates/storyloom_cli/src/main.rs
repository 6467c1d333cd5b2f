use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use story_store::{FileKeyValueStore, KeyValueStore};
use storyloom::config::EnvConfig;
use storyloom::logging::init_logging;
use storyloom::{GenerationRuntime, TextBuffer, Workbench};
use storyloom_cli::app::CliApp;
use storyloom_cli::commands::HELP_TEXT;
use storyloom_cli::preferences::Preferences;
use storyloom_cli::providers;

const PENDING_REPLY_GRACE: Duration = Duration::from_secs(120);

enum Input {
    Line(String),
    Wake,
    Closed,
}

fn main() -> io::Result<()> {
    init_logging();

    let config = EnvConfig::from_env();
    let cwd = std::env::current_dir()?;
    let data_root = config.data_root(&cwd);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&data_root));

    let provider = providers::provider_from_config(&config).map_err(io::Error::other)?;
    let profile = provider.profile();

    let workbench = Arc::new(Mutex::new(Workbench::open(
        Arc::clone(&store),
        Box::new(TextBuffer::new()),
        config.system_instructions.clone(),
    )));

    let (sender, receiver) = mpsc::channel::<Input>();
    let wake_sender = sender.clone();
    let runtime = GenerationRuntime::with_waker(workbench, provider, move || {
        let _ = wake_sender.send(Input::Wake);
    });

    std::thread::Builder::new()
        .name("storyloom-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "stdin read failed");
                        break;
                    }
                }
            }
            let _ = sender.send(Input::Closed);
        })?;

    let mut app = CliApp::new(runtime, Preferences::load(store));
    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "storyloom ({} / {}), data in {}, theme {}",
        profile.provider_id,
        profile.model_id,
        data_root.display(),
        app.theme()
    )?;
    writeln!(stdout, "{HELP_TEXT}")?;

    for input in receiver {
        let closed = matches!(input, Input::Closed);
        let lines = match input {
            Input::Line(line) => app.on_line(&line),
            Input::Wake => app.on_wake(),
            Input::Closed => app.on_input_closed(PENDING_REPLY_GRACE),
        };

        for line in lines {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;

        if closed || app.should_exit {
            break;
        }
    }

    Ok(())
}
