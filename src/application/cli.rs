#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Attachment;
use crate::domain::models::Settings;
use crate::domain::services::help_text;
use crate::domain::services::ChatSession;
use crate::domain::services::Documents;
use crate::domain::services::SettingsStoreManager;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::embedders::EmbedderManager;

const SETTINGS_STORES: [&str; 2] = ["file", "memory"];
const DOCUMENT_MODES: [&str; 2] = ["attach", "index"];

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn print_settings(settings: &Settings) {
    let mut api_key = settings.masked_api_key();
    if api_key.is_empty() {
        api_key = "(not set)".to_string();
    }

    println!("API key:       {api_key}");
    println!("Model:         {}", settings.selected_model);
    println!("System prompt: {}", settings.system_prompt);
}

/// Answers a single question with the saved settings and prints the reply.
async fn ask(prompt: &str, file_path: Option<&String>) -> Result<()> {
    let store = SettingsStoreManager::get(&Config::get(ConfigKey::SettingsStore))?;
    let mut settings = store.load().await?;
    if let Some(file_path) = file_path {
        settings.attachment = Attachment::from_path(file_path).await?;
    }

    let mut session = ChatSession::default();
    if let Some(upload) = settings.attachment.document() {
        if Config::get(ConfigKey::DocumentMode) == "index" {
            let token = settings.embedding_token();
            if token.is_empty() {
                bail!("document-mode is set to index, but no Gemini embedding token is available. Set embedding-token in your config.");
            }

            let index = Documents::index(&[upload.clone()], EmbedderManager::get(&token)).await?;
            session.set_index(Some(index));
        }
    }

    let backend = BackendManager::get(settings.backend(), &settings.api_key);
    let reply = session.submit(&settings, backend.as_ref(), prompt).await?;
    println!("{reply}");

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_settings() -> Command {
    return Command::new("settings")
        .about("Inspect or reset the saved chat settings.")
        .subcommand(Command::new("path").about("Prints where settings are stored."))
        .subcommand(Command::new("show").about("Prints the saved settings. The API key is masked."))
        .subcommand(Command::new("reset").about("Deletes the saved settings."));
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Asks a single question using the saved settings and prints the reply.")
        .arg(
            Arg::new("prompt")
                .help("The question to send.")
                .required(true),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .num_args(1)
                .help("Image or document to send along with the question."),
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start a new chat session.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("parlor")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_ask())
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .subcommand(subcommand_settings())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PARLOR_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
                .long(ConfigKey::BackendHealthCheckTimeout.to_string())
                .env("PARLOR_BACKEND_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when doing a health check for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ClaudeURL.to_string())
                .long(ConfigKey::ClaudeURL.to_string())
                .env("PARLOR_CLAUDE_URL")
                .num_args(1)
                .help(format!("Claude API URL. [default: {}]", Config::default(ConfigKey::ClaudeURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::DocumentMode.to_string())
                .short('d')
                .long(ConfigKey::DocumentMode.to_string())
                .env("PARLOR_DOCUMENT_MODE")
                .num_args(1)
                .help(format!("How documents set in the settings are used. Attach sends the whole file with every message, index retrieves the most relevant passages. [default: {}]", Config::default(ConfigKey::DocumentMode)))
                .value_parser(PossibleValuesParser::new(DOCUMENT_MODES))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::EmbeddingToken.to_string())
                .long(ConfigKey::EmbeddingToken.to_string())
                .env("PARLOR_EMBEDDING_TOKEN")
                .num_args(1)
                .help("Gemini API key used to embed documents when chatting with a Claude model in index mode.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("PARLOR_GEMINI_URL")
                .num_args(1)
                .help(format!("Gemini API URL. [default: {}]", Config::default(ConfigKey::GeminiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SettingsFile.to_string())
                .long(ConfigKey::SettingsFile.to_string())
                .env("PARLOR_SETTINGS_FILE")
                .num_args(1)
                .help(format!("Path to the settings file used by the file settings store. [default: {}]", Config::default(ConfigKey::SettingsFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SettingsStore.to_string())
                .long(ConfigKey::SettingsStore.to_string())
                .env("PARLOR_SETTINGS_STORE")
                .num_args(1)
                .help(format!("Where settings are persisted between runs. [default: {}]", Config::default(ConfigKey::SettingsStore)))
                .value_parser(PossibleValuesParser::new(SETTINGS_STORES))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("PARLOR_USERNAME")
                .num_args(1)
                .help("Your user name displayed in all chat bubbles. [default: $USER]")
                .global(true),
        );
}

/// Parses arguments and runs one-shot commands. Returns true when the chat UI
/// should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("ask", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let prompt = match subcmd_matches.get_one::<String>("prompt") {
                Some(prompt) => prompt,
                None => bail!("A prompt is required."),
            };
            ask(prompt, subcmd_matches.get_one::<String>("file")).await?;
            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        Some(("settings", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let store = SettingsStoreManager::get(&Config::get(ConfigKey::SettingsStore))?;
            match subcmd_matches.subcommand() {
                Some(("path", _)) => {
                    println!("{}", store.location());
                }
                Some(("show", _)) => {
                    print_settings(&store.load().await?);
                }
                Some(("reset", _)) => {
                    store.reset().await?;
                    println!("Settings have been reset.");
                }
                _ => {
                    subcommand_settings().print_long_help()?;
                }
            }
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
