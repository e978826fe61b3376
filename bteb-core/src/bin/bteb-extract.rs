use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::*;
use tracing_subscriber::EnvFilter;

use bteb_core::batch::{BatchOrchestrator, LeaveUnset, SemesterSource};
use bteb_core::config::{DateSearch, ExtractConfig, ExtractConfigBuilder, MetadataStamping};
use bteb_core::consts::{DEFAULT_HEADER_LINES, OUTPUT_DIR_NAME};
use bteb_core::error::BtebError;
use bteb_core::source::{InputKind, InputSource, PdfiumSource};

#[derive(Parser)]
#[command(name = "bteb-extract")]
#[command(about = "Extract BTEB result sheets into JSON records")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a single result document
    File {
        #[arg(help = "Input .pdf or .txt file, asked for when omitted")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Output directory [default: current directory]")]
        output: Option<PathBuf>,

        #[arg(long, help = "Semester for records without one")]
        semester: Option<String>,
    },
    /// Extract every result document of a directory
    Batch {
        #[arg(help = "Input directory, asked for when omitted")]
        dir: Option<PathBuf>,

        #[arg(short, long, help = "Output directory [default: <DIR>/output]")]
        output: Option<PathBuf>,

        #[arg(long, help = "Semester used instead of asking when a document has none")]
        semester: Option<String>,

        #[arg(long, help = "Never ask for a semester, leave it unset")]
        no_prompt: bool,

        #[arg(long, help = "Extract documents in parallel")]
        parallel: bool,
    },
}

#[derive(Args)]
struct SharedArgs {
    #[arg(long, global = true, value_enum, default_value_t = Stamping::AtEmission)]
    stamping: Stamping,

    #[arg(long, global = true, value_enum, default_value_t = DateScope::Anywhere)]
    date_search: DateScope,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_HEADER_LINES,
        help = "Lines searched for the date with --date-search header"
    )]
    header_lines: usize,

    #[arg(long, global = true, help = "Skip text cleanup of extracted pages")]
    no_clean_text: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stamping {
    AtEmission,
    Retroactive,
}

#[derive(Clone, Copy, ValueEnum)]
enum DateScope {
    Anywhere,
    Header,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl SharedArgs {
    fn config(
        &self,
        semester: Option<String>,
        parallel: bool,
    ) -> anyhow::Result<ExtractConfig> {
        let mut builder = ExtractConfigBuilder::default();
        builder
            .stamping(match self.stamping {
                Stamping::AtEmission => MetadataStamping::AtEmission,
                Stamping::Retroactive => MetadataStamping::Retroactive,
            })
            .date_search(match self.date_search {
                DateScope::Anywhere => DateSearch::Anywhere,
                DateScope::Header => DateSearch::Header {
                    lines: self.header_lines,
                },
            })
            .auto_clean_text(!self.no_clean_text)
            .parallel(parallel);
        if let Some(semester) = semester.filter(|s| !s.trim().is_empty()) {
            builder.default_semester(semester.trim());
        }
        Ok(builder.build()?)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn read_answer(question: &str) -> std::io::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn path_or_ask(path: Option<PathBuf>, question: &str) -> anyhow::Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    let answer = read_answer(question).context("read path from stdin")?;
    if answer.is_empty() {
        bail!("no input path given");
    }
    Ok(PathBuf::from(answer))
}

/// Asks on the terminal for the semester of a document; a blank answer leaves it unset.
struct StdinPrompt;

impl SemesterSource for StdinPrompt {
    fn semester_for(&mut self, document: &Path, missing: usize) -> Result<Option<String>, BtebError> {
        let question = format!(
            "{} records of {} have no semester. Enter the semester (e.g. 4th), or leave blank: ",
            missing,
            document.display()
        );
        let answer = read_answer(&question).map_err(|e| BtebError::SemesterInput {
            path: document.display().to_string(),
            message: e.to_string(),
        })?;
        Ok((!answer.is_empty()).then_some(answer))
    }
}

fn input_source(needs_pdfium: bool) -> anyhow::Result<InputSource> {
    if !needs_pdfium {
        return Ok(InputSource::text_only());
    }
    let pdfium = PdfiumSource::new().context("load PDFium")?;
    Ok(InputSource::new(Some(pdfium)))
}

fn run_file(
    shared: &SharedArgs,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    semester: Option<String>,
) -> anyhow::Result<()> {
    let input = path_or_ask(input, "Enter the path of the result file: ")?;
    let output = output.unwrap_or_else(|| PathBuf::from("."));
    let config = shared.config(semester, false)?;

    let source = input_source(InputKind::for_path(&input) == Some(InputKind::Pdf))?;
    let orchestrator = BatchOrchestrator::new(&source, config);
    let report = orchestrator.process_file(&input, &output, &mut StdinPrompt)?;
    info!(
        "{} records written to {}.",
        report.records,
        report.output.display()
    );
    Ok(())
}

fn run_batch(
    shared: &SharedArgs,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    semester: Option<String>,
    no_prompt: bool,
    parallel: bool,
) -> anyhow::Result<()> {
    let dir = path_or_ask(dir, "Enter the directory of the result files: ")?;
    let output = output.unwrap_or_else(|| dir.join(OUTPUT_DIR_NAME));
    let config = shared.config(semester, parallel)?;

    let inputs = BatchOrchestrator::<InputSource>::discover(&dir)?;
    let needs_pdfium = inputs
        .iter()
        .any(|input| InputKind::for_path(input) == Some(InputKind::Pdf));
    let source = input_source(needs_pdfium)?;

    let orchestrator = BatchOrchestrator::new(&source, config);
    let report = if no_prompt {
        orchestrator.run(&dir, &output, &mut LeaveUnset)?
    } else {
        orchestrator.run(&dir, &output, &mut StdinPrompt)?
    };

    for failure in &report.failures {
        warn!("Skipped {}: {}", failure.input.display(), failure.error);
    }
    if !report.failures.is_empty() {
        bail!(
            "{} of {} documents failed",
            report.failures.len(),
            report.total()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.shared.log_format);

    match cli.command {
        Command::File {
            input,
            output,
            semester,
        } => run_file(&cli.shared, input, output, semester),
        Command::Batch {
            dir,
            output,
            semester,
            no_prompt,
            parallel,
        } => run_batch(&cli.shared, dir, output, semester, no_prompt, parallel),
    }
}
