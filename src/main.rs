//! notecell - command-line front end
//!
//! Runs markdown through the same pipeline a notebook cell uses: render,
//! sanitize, flatten into lines, and convert edited HTML back to markdown.

use clap::{Parser, Subcommand};
use log::{error, info};
use notecell::cell::{CellModel, CellServices, CellSource, MarkdownCellView, NotebookModel};
use notecell::config::ConfigurationService;
use notecell::convert::HtmlMarkdownConverter;
use notecell::error::{Error, Result};
use notecell::theme::ThemeService;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use url::Url;

/// Application name constant.
const APP_NAME: &str = "notecell";

#[derive(Parser)]
#[command(version, about = "Render, convert and inspect notebook markdown cells", long_about = None)]
struct Cli {
    /// Settings file to use instead of the user configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a markdown file and print the displayed HTML
    Render {
        file: PathBuf,
        /// Sanitize the output as for an untrusted notebook
        #[arg(long)]
        untrusted: bool,
        /// Notebook the cell belongs to, for resolving relative links
        #[arg(long)]
        notebook: Option<PathBuf>,
    },
    /// Convert an HTML file to markdown
    Convert {
        file: PathBuf,
        /// Notebook whose folder local links are made relative to
        #[arg(long)]
        notebook: Option<PathBuf>,
        /// Write the markdown to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the rendered text of a markdown file, one numbered line per leaf
    Lines { file: PathBuf },
    /// List the markdown cells of a Jupyter notebook
    Cells { notebook: PathBuf },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{} failed: {}", APP_NAME, e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: Option<&Path>) -> Result<()> {
    match command {
        Command::Render {
            file,
            untrusted,
            notebook,
        } => {
            let view = render_file(&file, !untrusted, notebook.as_deref(), services(config)?)?;
            println!("{}", view.borrow().output_html().trim_end());
        }
        Command::Convert {
            file,
            notebook,
            output,
        } => {
            let html = fs::read_to_string(&file)?;
            let folder = notebook
                .as_deref()
                .map(absolute)
                .transpose()?
                .and_then(|path| path.parent().map(Path::to_path_buf));
            let markdown = HtmlMarkdownConverter::new(folder).convert(&html);
            match output {
                Some(path) => {
                    fs::write(&path, format!("{}\n", markdown))
                        .map_err(|source| Error::FileWrite { path: path.clone(), source })?;
                    info!("Wrote {}", path.display());
                }
                None => println!("{}", markdown),
            }
        }
        Command::Lines { file } => {
            let view = render_file(&file, true, None, services(config)?)?;
            for (i, line) in view.borrow().rendered_text_output().iter().enumerate() {
                println!("{:>4}  {}", i + 1, line.trim_end());
            }
        }
        Command::Cells { notebook } => {
            let model = Rc::new(NotebookModel::from_ipynb(&notebook)?);
            if model.cells().is_empty() {
                return Err(Error::Application(format!(
                    "{} has no markdown cells",
                    notebook.display()
                )));
            }
            let services = services(config)?;
            for cell in model.cells() {
                let view =
                    MarkdownCellView::create(Rc::clone(cell), Rc::clone(&model), services.clone());
                let lines = view.borrow().output().leaf_count();
                let first_line = cell.source().joined();
                let first_line = first_line.lines().next().unwrap_or("");
                println!("{:<12} {:>4} lines  {}", cell.id(), lines, first_line);
            }
        }
    }
    Ok(())
}

fn services(config: Option<&Path>) -> Result<CellServices> {
    let config = match config {
        Some(path) => ConfigurationService::load_from(path)?,
        None => ConfigurationService::load(),
    };
    let theme = ThemeService::new(config.settings().theme);
    Ok(CellServices::new(Rc::new(config), Rc::new(theme)))
}

fn render_file(
    file: &Path,
    trusted: bool,
    notebook: Option<&Path>,
    services: CellServices,
) -> Result<Rc<std::cell::RefCell<MarkdownCellView>>> {
    let markdown = fs::read_to_string(file)?;
    let uri = match notebook {
        Some(path) => {
            let path = absolute(path)?;
            Some(Url::from_file_path(&path).map_err(|()| Error::InvalidUri {
                uri: path.display().to_string(),
                source: None,
            })?)
        }
        None => None,
    };
    info!("Rendering {} (trusted: {})", file.display(), trusted);

    let cell = Rc::new(CellModel::new("1", CellSource::from_markdown(&markdown)));
    let notebook = Rc::new(NotebookModel::new(uri, vec![Rc::clone(&cell)]));
    notebook.set_trusted(trusted);
    Ok(MarkdownCellView::create(cell, notebook, services))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
