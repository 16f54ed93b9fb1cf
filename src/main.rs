//! sidelines CLI: a terminal host for the reading engine.
//!
//! Each invocation restores the stored session, runs one command, prints the
//! narrow status line, and flushes any pending state before exiting.

use std::cell::RefCell;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use sidelines::config::ReaderConfig;
use sidelines::error::{SidelinesError, SidelinesResult};
use sidelines::library::FsLoader;
use sidelines::paths::ReaderPaths;
use sidelines::persist::JsonFileStore;
use sidelines::reader::surface::{ScrollReport, SurfaceError, SurfaceResult, WideSeed};
use sidelines::reader::{
    Host, HostPrompts, NarrowSurface, Notice, NoticeLevel, PanelMessage, Reader, ReplaceDecision,
    StatusLine, WideSurface,
};

#[derive(Parser)]
#[command(name = "sidelines", version, about = "Read long texts one line at a time")]
struct Cli {
    /// Directory for config and reading state (overrides XDG locations).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Answer "replace" when re-opening a file that is already loaded.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a file (prompts for a path when none is given).
    Open {
        path: Option<PathBuf>,
    },

    /// Add pasted text as a document (reads stdin when no text is given).
    Paste {
        text: Option<String>,
    },

    /// List documents in the library.
    List,

    /// List chapters of the current document.
    Chapters,

    /// Jump to a chapter by index.
    Chapter {
        index: usize,
    },

    /// Step forward by the fine step.
    Next,

    /// Step back by the fine step.
    Prev,

    /// Jump forward by a page.
    PageNext,

    /// Jump back by a page.
    PagePrev,

    /// Move to the next chapter.
    NextChapter,

    /// Move to the previous chapter.
    PrevChapter,

    /// Show the current reading window.
    Show,

    /// Select a document by ID.
    Select {
        id: String,
    },

    /// Remove a document by ID.
    Remove {
        id: String,
    },

    /// Remove every document whose source file is missing.
    CleanupMissing,

    /// Remove all documents.
    Clear,

    /// Print the whole current chapter, optionally moving the reading
    /// position to where the reader scrolled to.
    Wide {
        /// Scrolled-to position as a fraction of the chapter (0.0 to 1.0).
        #[arg(long, conflicts_with = "offset")]
        percent: Option<f64>,

        /// Scrolled-to character offset.
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Show the effective configuration, or write it to the config file.
    Config {
        #[arg(long)]
        write: bool,
    },
}

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    run(Cli::parse())?;
    Ok(())
}

fn run(cli: Cli) -> SidelinesResult<()> {
    let paths = match &cli.data_dir {
        Some(dir) => ReaderPaths::rooted_at(dir),
        None => ReaderPaths::resolve()?,
    };
    let config = ReaderConfig::load_or_default(&paths.config_file())?;

    if let Commands::Config { write } = cli.command {
        if write {
            config.save(&paths.config_file())?;
            println!("Wrote {}", paths.config_file().display());
        } else {
            print!("{}", config.to_toml()?);
        }
        return Ok(());
    }

    paths.ensure_dirs()?;
    let store = JsonFileStore::open_or_empty(&paths.state_file());

    let status = Rc::new(RefCell::new(None));
    let host = Host {
        narrow: Box::new(TerminalLine(status.clone())),
        wide: Box::new(TerminalPanel::default()),
        prompts: Box::new(TerminalPrompts { assume_yes: cli.yes }),
        loader: Box::new(FsLoader),
    };
    let mut reader = Reader::new(config, store, host);
    reader.restore(Instant::now());

    let now = Instant::now();
    let mut print_status = true;
    match cli.command {
        Commands::Open { path } => {
            match path {
                Some(path) => {
                    let path = std::path::absolute(&path)
                        .map_err(|source| SidelinesError::Input { source })?;
                    reader.open_file(&path, now)?;
                }
                None => {
                    reader.select_file(now);
                }
            }
        }

        Commands::Paste { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .map_err(|source| SidelinesError::Input { source })?;
                    buf
                }
            };
            reader.load_pasted_text(&text, now);
        }

        Commands::List => {
            print_status = false;
            let entries = reader.library_view();
            if entries.is_empty() {
                println!("Library is empty.");
            }
            for entry in entries {
                let current = if entry.is_current { '*' } else { ' ' };
                let chapter = entry.chapter_title.unwrap_or_default();
                println!(
                    "{current} {:<24} {:<8} {:>3}%  {}  {}",
                    entry.id,
                    entry.status.to_string(),
                    entry.progress,
                    entry.name,
                    chapter
                );
            }
        }

        Commands::Chapters => {
            print_status = false;
            let chapters = reader.chapter_view();
            if chapters.is_empty() {
                println!("No document selected.");
            }
            for chapter in chapters {
                let current = if chapter.is_current { '*' } else { ' ' };
                println!("{current} {:>4}  {}", chapter.index, chapter.title);
            }
        }

        Commands::Chapter { index } => {
            if !reader.select_chapter(index, now) && reader.cursor().chapter_index() != index {
                return Err(SidelinesError::NoSuchChapter {
                    index,
                    count: reader.chapter_view().len(),
                });
            }
        }

        Commands::Next => reader.step_right(now),
        Commands::Prev => reader.step_left(now),
        Commands::PageNext => reader.page_right(now),
        Commands::PagePrev => reader.page_left(now),

        Commands::NextChapter => {
            reader.next_chapter(now);
        }

        Commands::PrevChapter => {
            reader.previous_chapter(now);
        }

        Commands::Show => {}

        Commands::Select { id } => {
            reader.select_document(&id, now)?;
        }

        Commands::Remove { id } => {
            reader.remove_document(&id, now)?;
            println!("Removed {id}.");
        }

        Commands::CleanupMissing => {
            reader.cleanup_missing(now);
        }

        Commands::Clear => {
            reader.clear_library(now);
            println!("Library cleared.");
        }

        Commands::Wide { percent, offset } => {
            if reader.toggle_wide(now) {
                if percent.is_some() || offset.is_some() {
                    let report = ScrollReport {
                        scroll_top: 0.0,
                        percentage: percent.unwrap_or(0.0),
                        char_offset: offset,
                    };
                    reader.on_panel_message(PanelMessage::Scrolled(report), now);
                }
                reader.on_panel_message(PanelMessage::Closed, now);
            }
        }

        Commands::Config { .. } => {}
    }

    reader.shutdown(Instant::now());

    if print_status {
        match status.borrow().as_ref() {
            Some(line) => println!("{}", line.render()),
            None => {
                if reader.active_id().is_none() {
                    println!("No document selected.");
                }
            }
        }
    }
    Ok(())
}

/// Narrow surface that keeps the latest line for printing on exit.
struct TerminalLine(Rc<RefCell<Option<StatusLine>>>);

impl NarrowSurface for TerminalLine {
    fn show(&mut self, line: &StatusLine) {
        *self.0.borrow_mut() = Some(line.clone());
    }

    fn clear(&mut self) {
        *self.0.borrow_mut() = None;
    }
}

/// Wide panel that prints the chapter once. Printed output cannot report
/// back, so the panel is never alive after opening.
#[derive(Default)]
struct TerminalPanel;

impl WideSurface for TerminalPanel {
    fn open(&mut self, seed: &WideSeed) -> SurfaceResult<()> {
        let mut out = std::io::stdout().lock();
        let (before, after): (String, String) = {
            let split = seed
                .text
                .char_indices()
                .nth(seed.offset)
                .map(|(i, _)| i)
                .unwrap_or(seed.text.len());
            (seed.text[..split].to_string(), seed.text[split..].to_string())
        };
        writeln!(
            out,
            "== {} ({:.0}%) ==\n{before}▶{after}\n",
            seed.title,
            seed.percentage * 100.0
        )
        .map_err(|e| SurfaceError::Channel {
            message: e.to_string(),
        })
    }

    fn is_alive(&self) -> bool {
        false
    }

    fn probe_position(&mut self) -> SurfaceResult<ScrollReport> {
        Err(SurfaceError::Disposed)
    }

    fn dispose(&mut self) {}
}

/// Prompts on stderr, answers from stdin.
struct TerminalPrompts {
    assume_yes: bool,
}

impl TerminalPrompts {
    fn ask(&self, question: &str) -> Option<String> {
        eprint!("{question} ");
        std::io::stderr().flush().ok();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl HostPrompts for TerminalPrompts {
    fn pick_file(&mut self) -> Option<PathBuf> {
        self.ask("File to open:")
            .filter(|answer| !answer.is_empty())
            .map(PathBuf::from)
            .and_then(|path| std::path::absolute(path).ok())
    }

    fn confirm_replace(&mut self, document_name: &str) -> ReplaceDecision {
        if self.assume_yes {
            return ReplaceDecision::Replace;
        }
        let answer = self.ask(&format!("\"{document_name}\" is already open. Reload it? [y/N]"));
        match answer.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("y") | Some("yes") => ReplaceDecision::Replace,
            _ => ReplaceDecision::Cancel,
        }
    }

    fn notify(&mut self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "note",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("{prefix}: {}", notice.message);
    }
}
