//! Command-line front end for WAD archives and LIN scripts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shsl_rs::{
    ArchiveReader, ArchiveWriter, AssetSet, Config, OpcodeLengthTable, Preview, Script, Workspace,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "shsl", version, about = "Browse WAD archives and decompile LIN scripts")]
struct Cli {
    /// TOML file with the game layout and decompiler options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the files of a single archive
    List {
        wad: PathBuf,
        /// Only list the children of this directory
        dir: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Extract a file or directory from a single archive
    Extract {
        wad: PathBuf,
        path: String,
        #[arg(default_value = ".")]
        out_dir: PathBuf,
    },
    /// List a directory merged across all archives of a game
    Tree {
        game_dir: PathBuf,
        #[arg(default_value = "")]
        dir: String,
        #[arg(long)]
        json: bool,
    },
    /// Print a file from a game, decompiling scripts
    Cat {
        game_dir: PathBuf,
        path: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the event scripts of a game
    Scripts {
        game_dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Decompile a script file from disk
    Decompile {
        input: PathBuf,
        /// Print the decoded instructions and strings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build an archive from a directory
    Pack { output: PathBuf, input_dir: PathBuf },
}

fn set_up_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

fn open_game(config: Config, game_dir: &Path) -> Result<Workspace> {
    let mut workspace = Workspace::new(config);
    workspace
        .open_game_dir(game_dir)
        .with_context(|| format!("failed to open game directory: {}", game_dir.display()))?;
    Ok(workspace)
}

fn cmd_list(wad: &Path, dir: Option<&str>, json: bool) -> Result<()> {
    let reader = ArchiveReader::open(wad)
        .with_context(|| format!("failed to open archive: {}", wad.display()))?;

    match dir {
        Some(dir) => {
            let children = reader.list_dir(dir, false)?;
            if json {
                return print_json(&children);
            }
            for child in children {
                println!("{}", child);
            }
        }
        None => {
            if json {
                return print_json(&reader.files());
            }
            for entry in reader.files() {
                println!("{:>10}  {}", entry.size, entry.path);
            }
        }
    }
    Ok(())
}

fn cmd_extract(wad: &Path, path: &str, out_dir: &Path) -> Result<()> {
    let mut reader = ArchiveReader::open(wad)
        .with_context(|| format!("failed to open archive: {}", wad.display()))?;

    let written = reader
        .extract(path, out_dir)
        .with_context(|| format!("failed to extract {} from {}", path, wad.display()))?;
    for dest in &written {
        println!("{}", dest.display());
    }
    Ok(())
}

fn cmd_tree(config: &Config, game_dir: &Path, dir: &str, json: bool) -> Result<()> {
    let assets = AssetSet::open_game_dir(game_dir, &config.layout)
        .with_context(|| format!("failed to open game directory: {}", game_dir.display()))?;
    let listing = assets.list_directory(dir)?;

    if json {
        return print_json(&listing);
    }
    for entry in listing {
        let size = entry
            .size
            .map_or_else(|| "<dir>".to_string(), |size| size.to_string());
        println!("{:>10}  {:<10}  {}", size, entry.role.name(), entry.name);
    }
    Ok(())
}

fn cmd_cat(config: Config, game_dir: &Path, path: &str, output: Option<&Path>) -> Result<()> {
    let mut workspace = open_game(config, game_dir)?;
    let bytes = match workspace.preview(path)? {
        Preview::Script(text) => text.into_bytes(),
        Preview::Pak(entries) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| format!("{:>5}  {:>10}\n", index, entry.len()))
            .collect::<String>()
            .into_bytes(),
        Preview::Image(bytes) | Preview::Binary(bytes) => bytes,
    };

    match output {
        Some(output) => fs::write(output, &bytes)
            .with_context(|| format!("failed to write {}", output.display()))?,
        None => io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

fn cmd_scripts(config: Config, game_dir: &Path, json: bool) -> Result<()> {
    let workspace = open_game(config, game_dir)?;
    let scripts = workspace.scripts()?;

    if json {
        return print_json(&scripts);
    }
    for script in scripts {
        println!("{:>10}  {}", script.size, script.path);
    }
    Ok(())
}

fn cmd_decompile(config: &Config, input: &Path, json: bool) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let script = Script::decode(&bytes, &OpcodeLengthTable::STANDARD)
        .with_context(|| format!("failed to decode {}", input.display()))?;

    if json {
        println!("{}", script.to_json()?);
        return Ok(());
    }
    print!("{}", script.decompile(&config.decompile));
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let relative = path.strip_prefix(root)?.to_string_lossy().replace('\\', "/");
            out.push((relative, path));
        }
    }
    Ok(())
}

fn cmd_pack(output: &Path, input_dir: &Path) -> Result<()> {
    let mut files = Vec::new();
    collect_files(input_dir, input_dir, &mut files)?;
    files.sort();

    let mut writer = ArchiveWriter::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    for (name, source) in &files {
        writer.add_file_from_disk(name, source)?;
    }
    writer.finalize()?;

    info!(count = files.len(), output = %output.display(), "packed archive");
    Ok(())
}

fn main() -> Result<()> {
    set_up_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::List { wad, dir, json } => cmd_list(&wad, dir.as_deref(), json),
        Command::Extract { wad, path, out_dir } => cmd_extract(&wad, &path, &out_dir),
        Command::Tree { game_dir, dir, json } => cmd_tree(&config, &game_dir, &dir, json),
        Command::Cat {
            game_dir,
            path,
            output,
        } => cmd_cat(config, &game_dir, &path, output.as_deref()),
        Command::Scripts { game_dir, json } => cmd_scripts(config, &game_dir, json),
        Command::Decompile { input, json } => cmd_decompile(&config, &input, json),
        Command::Pack { output, input_dir } => cmd_pack(&output, &input_dir),
    }
}
