//! ZIGGURAT TWIN - Interactive Entry Point
//!
//! Digital twin loop: Survey → Persona → Memory
//! Chat flow: Query → Embed → Search → Context → Generate → Save

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_chrome::ChromeLayerBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use zikkurat_twin::{SurveyAnswers, TwinConfig, TwinEngine};

/// Characters of memory text shown in listings
const MEMORY_PREVIEW_CHARS: usize = 200;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gemini API key; without it the twin runs on offline stubs
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Force offline provider even when a key is available
    #[arg(long)]
    offline: bool,

    /// Name the twin speaks as
    #[arg(long)]
    name: Option<String>,

    /// Number of memories to retrieve per query
    #[arg(long)]
    top_k: Option<usize>,

    /// Survey answers (JSON object) to ingest on startup
    #[arg(long)]
    survey: Option<PathBuf>,

    /// Answer one prompt and exit
    #[arg(long)]
    prompt: Option<String>,

    /// Treat --prompt as a decision to simulate
    #[arg(long)]
    decide: bool,

    /// Enable tracing (generates a trace-timestamp.json file).
    #[arg(long)]
    tracing: bool,
}

/// One line of REPL input
#[derive(Debug, PartialEq)]
enum Command {
    Chat(String),
    Decide { situation: String, store: bool },
    Survey(PathBuf),
    Persona,
    Memories,
    Delete(Vec<usize>),
    Clear { keep_permanent: bool },
    Remember { kind: String, permanent: bool, text: String },
    Name(String),
    Key(Option<String>),
    Stats,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Command::Quit;
        }
        if !line.starts_with('/') {
            return Command::Chat(line.to_string());
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "/decide" | "/decide!" if !rest.is_empty() => Command::Decide {
                situation: rest.to_string(),
                store: name == "/decide",
            },
            "/survey" if !rest.is_empty() => Command::Survey(PathBuf::from(rest)),
            "/persona" => Command::Persona,
            "/memories" => Command::Memories,
            "/delete" => {
                let indices: Result<Vec<usize>, _> =
                    rest.split_whitespace().map(str::parse::<usize>).collect();
                match indices {
                    Ok(indices) if !indices.is_empty() => Command::Delete(indices),
                    _ => Command::Invalid("usage: /delete <index> [index ...]".to_string()),
                }
            }
            "/clear" => Command::Clear {
                keep_permanent: !rest.eq_ignore_ascii_case("all"),
            },
            "/remember" => {
                let Some((kind, text)) = rest.split_once(char::is_whitespace) else {
                    return Command::Invalid("usage: /remember <kind> [!] <text>".to_string());
                };
                let text = text.trim();
                let (permanent, text) = match text.strip_prefix('!') {
                    Some(stripped) => (true, stripped.trim()),
                    None => (false, text),
                };
                if text.is_empty() {
                    return Command::Invalid("usage: /remember <kind> [!] <text>".to_string());
                }
                Command::Remember {
                    kind: kind.to_string(),
                    permanent,
                    text: text.to_string(),
                }
            }
            "/name" => Command::Name(rest.to_string()),
            "/key" => Command::Key((!rest.is_empty()).then(|| rest.to_string())),
            "/stats" => Command::Stats,
            "/help" => Command::Help,
            other => Command::Invalid(format!("unknown command {other}, try /help")),
        }
    }
}

fn print_help() {
    println!(
        "Commands:\n  \
         <text>                      chat with your twin\n  \
         /decide <situation>         what would I do? (stored as a decision)\n  \
         /decide! <situation>        simulate without storing\n  \
         /survey <file.json>         submit survey answers\n  \
         /persona                    show derived persona\n  \
         /memories                   list memories\n  \
         /delete <i> [j ...]         delete memories by index\n  \
         /clear [all]                clear memories (keeps permanent unless 'all')\n  \
         /remember <kind> [!] <text> add a memory, '!' marks it permanent\n  \
         /name <name>                change display name\n  \
         /key [key]                  set or drop the Gemini API key\n  \
         /stats                      memory statistics\n  \
         quit | exit                 leave"
    );
}

fn ingest_survey_file(engine: &TwinEngine, path: &Path) -> Result<()> {
    let answers = SurveyAnswers::load(path)?;
    let created = engine.ingest_survey(&answers);
    println!("🧬 Persona derived, {} memories created", created);
    println!("{}", engine.persona().describe());
    Ok(())
}

fn list_memories(engine: &TwinEngine) {
    let memories = engine.memories();
    if memories.is_empty() {
        println!("💭 No memories yet");
        return;
    }
    for (i, memory) in memories.iter().enumerate() {
        println!("{:>4}  {}", i, memory.preview(MEMORY_PREVIEW_CHARS));
    }
}

/// Executes one command. Returns false when the loop should stop.
fn run_command(engine: &TwinEngine, command: Command, top_k: usize) -> Result<bool> {
    match command {
        Command::Empty => {}
        Command::Quit => return Ok(false),
        Command::Chat(message) => {
            let reply = engine.chat(&message, top_k);
            println!("\n🤖 Twin: {}", reply);
        }
        Command::Decide { situation, store } => {
            let reply = engine.simulate_decision(&situation, top_k, store);
            println!("\n🤔 Twin would: {}", reply);
        }
        Command::Survey(path) => ingest_survey_file(engine, &path)?,
        Command::Persona => println!("{}", engine.persona().describe()),
        Command::Memories => list_memories(engine),
        Command::Delete(indices) => {
            let removed = engine.delete_memories(&indices);
            println!("🗑️ Removed {} memories", removed);
        }
        Command::Clear { keep_permanent } => {
            let removed = engine.clear_memories(keep_permanent);
            println!("🧹 Cleared {} memories", removed);
        }
        Command::Remember {
            kind,
            permanent,
            text,
        } => {
            engine.remember(&kind, &text, permanent)?;
            println!("💾 Remembered as {}", kind);
        }
        Command::Name(name) => {
            engine.set_display_name(&name);
            println!("👤 Speaking as {}", engine.persona().display_name);
        }
        Command::Key(key) => {
            let live = engine.reconfigure(key);
            println!(
                "🔑 Provider: {}",
                if live { "gemini" } else { "offline stubs" }
            );
        }
        Command::Stats => println!("{}", engine.stats().format()),
        Command::Help => print_help(),
        Command::Invalid(message) => println!("⚠️ {}", message),
    }
    Ok(true)
}

fn build_config(args: &Args) -> Result<TwinConfig> {
    let mut config = TwinConfig::load_or_default(args.config.as_deref())?;

    if let Some(name) = &args.name {
        config.display_name = name.clone();
    }
    if let Some(top_k) = args.top_k {
        config.recall_count = top_k;
    }
    if args.offline {
        config.provider.api_key = None;
    } else if args.api_key.is_some() {
        config.provider.api_key = args.api_key.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (chrome_layer, _guard) = if args.tracing {
        let (layer, guard) = ChromeLayerBuilder::new().build();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,zikkurat_twin=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(chrome_layer)
        .init();

    let config = build_config(&args)?;

    println!("🏛️ ZIGGURAT TWIN - Initializing...");
    let engine = TwinEngine::new(&config);
    println!(
        "✅ Twin of {} ready (provider: {})",
        config.display_name,
        engine.provider_name()
    );

    if let Some(path) = &args.survey {
        ingest_survey_file(&engine, path)
            .with_context(|| format!("Survey {} was not ingested", path.display()))?;
    }

    if let Some(prompt) = &args.prompt {
        let command = if args.decide {
            Command::Decide {
                situation: prompt.clone(),
                store: true,
            }
        } else {
            Command::Chat(prompt.clone())
        };
        run_command(&engine, command, config.recall_count)?;
        return Ok(());
    }

    println!("\n🗣️ Interactive mode - type /help for commands, 'quit' to exit");
    println!("========================================");

    loop {
        print!("\n📝 You: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match run_command(&engine, Command::parse(&input), config.recall_count) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    println!("{}", engine.stats().format());
    println!("👋 Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_and_control() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("EXIT"), Command::Quit);
        assert_eq!(
            Command::parse("What's your take on deadlines?"),
            Command::Chat("What's your take on deadlines?".to_string())
        );
        assert_eq!(Command::parse("/stats"), Command::Stats);
    }

    #[test]
    fn test_parse_decide() {
        assert_eq!(
            Command::parse("/decide Rent or buy?"),
            Command::Decide {
                situation: "Rent or buy?".to_string(),
                store: true
            }
        );
        assert_eq!(
            Command::parse("/decide! Rent or buy?"),
            Command::Decide {
                situation: "Rent or buy?".to_string(),
                store: false
            }
        );
        assert!(matches!(Command::parse("/decide"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_memory_commands() {
        assert_eq!(Command::parse("/delete 3 1"), Command::Delete(vec![3, 1]));
        assert!(matches!(Command::parse("/delete x"), Command::Invalid(_)));
        assert_eq!(
            Command::parse("/clear all"),
            Command::Clear {
                keep_permanent: false
            }
        );
        assert_eq!(
            Command::parse("/clear"),
            Command::Clear {
                keep_permanent: true
            }
        );
        assert_eq!(
            Command::parse("/remember correction ! I never drink coffee"),
            Command::Remember {
                kind: "correction".to_string(),
                permanent: true,
                text: "I never drink coffee".to_string()
            }
        );
        assert!(matches!(Command::parse("/remember chat"), Command::Invalid(_)));
        assert_eq!(Command::parse("/key"), Command::Key(None));
    }

    #[test]
    fn test_run_command_offline() -> Result<()> {
        let engine = TwinEngine::new(&TwinConfig::default());
        assert!(run_command(&engine, Command::parse("hello twin"), 5)?);
        assert_eq!(engine.memories().len(), 2);
        assert!(run_command(&engine, Command::parse("/remember gossip text"), 5).is_err());
        assert!(!run_command(&engine, Command::Quit, 5)?);
        Ok(())
    }
}
