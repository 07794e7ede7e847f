use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use log::{LevelFilter, warn};
use serde_json::{Map, Value, json};

use olecf::{Container, OpenOptions, StreamMetadata};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;

enum Action {
    List,
    Header,
    Stream { sid: u32, slack: bool },
    Properties { sid: u32 },
    Metadata,
}

struct OleCat {
    input: PathBuf,
    action: Action,
    options: OpenOptions,
    output: Option<PathBuf>,
}

impl OleCat {
    fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = PathBuf::from(
            matches
                .get_one::<String>("INPUT")
                .context("INPUT is a required argument")?,
        );

        let action = if let Some(&sid) = matches.get_one::<u32>("sid") {
            Action::Stream {
                sid,
                slack: matches.get_flag("slack"),
            }
        } else if let Some(&sid) = matches.get_one::<u32>("properties") {
            Action::Properties { sid }
        } else if matches.get_flag("metadata") {
            Action::Metadata
        } else if matches.get_flag("header") {
            Action::Header
        } else {
            Action::List
        };

        let mut options = OpenOptions::new().strict_clsid(matches.get_flag("strict"));
        if let Some(&code_page) = matches.get_one::<u32>("code-page") {
            options = options.default_code_page(code_page);
        }

        Ok(OleCat {
            input,
            action,
            options,
            output: matches.get_one::<String>("output").map(PathBuf::from),
        })
    }

    fn run(&self) -> Result<()> {
        let file = File::open(&self.input)
            .with_context(|| format!("Failed to open input file `{}`", self.input.display()))?;
        let container = Container::open_with(io::BufReader::new(file), self.options.clone())
            .with_context(|| format!("Failed to read compound file `{}`", self.input.display()))?;

        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create output file `{}`", path.display())
            })?)),
            None => Box::new(BufWriter::new(io::stdout())),
        };

        match self.action {
            Action::List => list(&container, &mut out)?,
            Action::Header => {
                serde_json::to_writer_pretty(&mut out, container.header())?;
                writeln!(out)?;
            }
            Action::Stream { sid, slack } => {
                let mut view = container
                    .stream(sid, slack)
                    .with_context(|| format!("Failed to open stream of entry {}", sid))?;
                io::copy(&mut view, &mut out)
                    .with_context(|| format!("Failed to read stream of entry {}", sid))?;
            }
            Action::Properties { sid } => {
                let stream = container
                    .property_set_stream(sid)
                    .with_context(|| format!("Failed to parse property sets of entry {}", sid))?;
                serde_json::to_writer_pretty(&mut out, &stream)?;
                writeln!(out)?;
            }
            Action::Metadata => {
                serde_json::to_writer_pretty(&mut out, &metadata(&container)?)?;
                writeln!(out)?;
            }
        }

        out.flush()?;
        Ok(())
    }
}

fn escape_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    path.chars().flat_map(char::escape_debug).collect()
}

fn list<T: olecf::ReadSeek>(container: &Container<T>, out: &mut dyn Write) -> Result<()> {
    for item in container.walk()? {
        let entry = container.entry(item.sid)?;
        writeln!(
            out,
            "{:>6}  {:<9} {:>12}  {}",
            item.sid,
            entry.entry_type.to_string(),
            entry.stream_size,
            escape_path(&item.path)
        )?;
    }
    for sid in container.orphans()? {
        let entry = container.entry(sid)?;
        writeln!(
            out,
            "{:>6}  {:<9} {:>12}  (orphan) {}",
            sid,
            entry.entry_type.to_string(),
            entry.stream_size,
            entry.display_name()
        )?;
    }
    Ok(())
}

/// Metadata of every property-set stream reachable from the root, keyed by path.
fn metadata<T: olecf::ReadSeek>(container: &Container<T>) -> Result<Value> {
    let mut streams = Map::new();
    for item in container.walk()? {
        let entry = container.entry(item.sid)?;
        if !entry.is_property_set_stream() {
            continue;
        }
        let value = match container.property_set_stream(item.sid) {
            Ok(stream) => serde_json::to_value(StreamMetadata::from(&stream))?,
            Err(e) => {
                warn!("entry {}: {}", item.sid, e);
                json!({ "error": e.to_string() })
            }
        };
        streams.insert(escape_path(&item.path), value);
    }
    Ok(Value::Object(streams))
}

fn cli() -> Command {
    Command::new("olecat")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Omer B. <omerbenamram@gmail.com>")
        .about("Utility to inspect OLE compound files and their property sets")
        .long_about(indoc!(r#"
            Utility to inspect OLE compound files (.doc, .xls, .ppt, .msg, Thumbs.db, ...).

            Without an action, every entry reachable from the root is listed together with
            entries that are present in the directory but not linked into the tree.
        "#))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("Path to a compound file"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .short('l')
                .action(ArgAction::SetTrue)
                .help("List directory entries (default)."),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .action(ArgAction::SetTrue)
                .help("Print the compound file header as JSON."),
        )
        .arg(
            Arg::new("sid")
                .long("sid")
                .short('s')
                .value_name("SID")
                .value_parser(clap::value_parser!(u32))
                .help("Write the raw bytes of the stream of entry SID."),
        )
        .arg(
            Arg::new("slack")
                .long("slack")
                .action(ArgAction::SetTrue)
                .requires("sid")
                .help("With --sid, also write the slack after the end of the stream."),
        )
        .arg(
            Arg::new("properties")
                .long("properties")
                .short('p')
                .value_name("SID")
                .value_parser(clap::value_parser!(u32))
                .help(
                    "Parse the stream of entry SID as a property-set stream and print it as JSON.",
                ),
        )
        .arg(
            Arg::new("metadata")
                .long("metadata")
                .short('m')
                .action(ArgAction::SetTrue)
                .help("Print the metadata of every property-set stream as JSON."),
        )
        .group(
            clap::ArgGroup::new("action")
                .args(["list", "header", "sid", "properties", "metadata"])
                .multiple(false),
        )
        .arg(
            Arg::new("code-page")
                .long("code-page")
                .value_name("CP")
                .value_parser(clap::value_parser!(u32))
                .help("Code page for property sets without a CodePage property (default: 1252)."),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Reject files whose header CLSID is not null."),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .help("Write output to FILE instead of stdout."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(indoc!("Sets debug prints level for the application:
                -v   - info
                -vv  - debug
                -vvv - trace
                NOTE: trace output is only available in debug builds, as it is extremely verbose.")),
        )
}

fn main() {
    let matches = cli().get_matches();

    let level = match matches.get_count("verbose") {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        if let Err(e) =
            simplelog::WriteLogger::init(level, simplelog::Config::default(), io::stderr())
        {
            eprintln!("Failed to initialize logging: {}", e);
        }
    }

    let result = OleCat::from_cli_matches(&matches).and_then(|olecat| {
        if olecat.output.as_ref().is_some_and(|p| p == &olecat.input) {
            bail!("Refusing to overwrite the input file");
        }
        olecat.run()
    });

    if let Err(e) = result {
        eprintln!("{:?}", e);
        exit(1);
    }
}
