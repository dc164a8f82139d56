pub mod catalog;
pub mod cli;
pub mod criteria;
pub mod display;
pub mod parser;
pub mod reader;
pub mod tail;

pub use cli::{Cli, Commands, OutputFormat, cli_parse};
pub use criteria::{CriteriaError, SearchCriteria};
pub use parser::{LogEntry, ParsedLine, parse_line};
pub use reader::{EntryStream, LogReader, ReadError};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli_parse();
    let reader = LogReader::new(&cli.dir);
    let format = cli.format;

    match &cli.command {
        Commands::Files { env } => {
            let files = match env {
                Some(env) => reader.log_files_for_environment(env),
                None => reader.log_files(),
            };
            match format {
                OutputFormat::Text => {
                    print!("{}", display::format_files_table(reader.root(), &files))
                }
                OutputFormat::Json => {
                    println!("{}", display::format_files_json(reader.root(), &files))
                }
            }
        }
        Commands::Search {
            term,
            regex,
            level,
            channel,
            env,
            context_key,
            context_value,
            limit,
            offset,
            file,
        } => {
            let mut criteria = SearchCriteria::new()
                .with_term(term.clone())
                .with_level(level.clone())
                .with_channel(channel.clone())
                .with_environment(env.clone())
                .with_context(context_key.clone(), context_value.clone())
                .with_limit(*limit)
                .with_offset(*offset);
            if let Some(pattern) = regex {
                criteria = criteria
                    .with_regex(pattern)
                    .map_err(|e| format!("Invalid search criteria: {e}"))?;
            }

            let entries: Vec<LogEntry> = match file {
                Some(path) => reader
                    .read_file(path, &criteria)
                    .map_err(|e| e.to_string())?
                    .collect(),
                None => match env {
                    Some(env) => reader.read_for_environment(env, &criteria).collect(),
                    None => reader.read_all(&criteria).collect(),
                },
            };

            match format {
                OutputFormat::Text => print!("{}", display::format_entries_text(&entries)),
                OutputFormat::Json => println!("{}", display::format_entries_json(&entries)),
            }
        }
        Commands::Tail { count, level, env } => {
            let entries = reader.tail(*count, level.as_deref(), env.as_deref());
            match format {
                OutputFormat::Text => print!("{}", display::format_entries_text(&entries)),
                OutputFormat::Json => println!("{}", display::format_entries_json(&entries)),
            }
        }
        Commands::Channels => {
            let channels = reader.unique_channels();
            match format {
                OutputFormat::Text => print!("{}", display::format_channels_text(&channels)),
                OutputFormat::Json => println!("{}", display::format_channels_json(&channels)),
            }
        }
    }

    Ok(())
}
