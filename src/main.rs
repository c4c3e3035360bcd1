//! 6502 Classifier CLI
//!
//! Command-line tool for recovering assembly listings from raw 6502
//! binaries: classify code and data from entrypoints, then print the
//! labeled listing.

use anyhow::{bail, Context};
use byteorder::{ByteOrder, LittleEndian};
use clap::{Parser, ValueEnum};
use m6502_classifier::{
    analyze_project, AnalyzerOptions, Entrypoint, Listing, OutputLine, Project, Syntax,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Code/data classifier and listing generator for raw 6502 binaries.
///
/// Classification starts from the given entrypoints and follows calls,
/// jumps, and branches; everything it cannot reach is rendered as data.
#[derive(Parser, Debug)]
#[command(name = "m6502-classify")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw binary file to analyze
    #[arg(required_unless_present = "project")]
    file: Option<PathBuf>,

    /// Analyze a saved project file instead of a raw binary
    #[arg(long, conflicts_with = "file")]
    project: Option<PathBuf>,

    /// Load address in hex (e.g. c000, $c000, 0xc000)
    #[arg(short, long, default_value = "1000", value_parser = parse_hex_addr)]
    start: u16,

    /// Take the load address from the file's two-byte prefix (.prg convention)
    #[arg(long)]
    prg: bool,

    /// Entrypoint in hex, with optional :data suffix (repeatable).
    /// Defaults to one code entrypoint at the load address.
    #[arg(short, long = "entry", value_name = "ADDR[:data]")]
    entries: Vec<String>,

    /// Seed extra entrypoints from known instruction-sequence signatures
    #[arg(long)]
    patterns: bool,

    /// Output format
    #[arg(short, long, default_value = "asm")]
    format: OutputFormat,

    /// Assembler syntax flavor
    #[arg(long, default_value = "acme")]
    syntax: SyntaxFlavor,

    /// Prefix for synthesized labels
    #[arg(long, default_value = "L")]
    label_prefix: String,

    /// Write the analysis inputs to a project file
    #[arg(long, value_name = "FILE")]
    save_project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (omit the header in human output)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Assembly source listing
    Asm,
    /// Address/bytes/instruction columns
    Human,
    /// JSON lines
    Json,
}

/// Assembler syntax options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyntaxFlavor {
    /// ACME (`!byte`, bare labels)
    Acme,
    /// ca65 (`.byte`, colon labels)
    Ca65,
}

impl SyntaxFlavor {
    fn to_syntax(self) -> Syntax {
        match self {
            SyntaxFlavor::Acme => Syntax::acme(),
            SyntaxFlavor::Ca65 => Syntax::ca65(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("m6502_classifier=debug,m6502_classify=debug")
            .init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut project = load_inputs(args)?;

    if !args.entries.is_empty() {
        for spec in &args.entries {
            project.entrypoints.push(parse_entry(spec)?);
        }
    } else if project.entrypoints.is_empty() {
        project.entrypoints.push(Entrypoint::code(project.start_address));
    }

    let syntax = args
        .syntax
        .to_syntax()
        .with_label_prefix(args.label_prefix.clone());
    let mut options = AnalyzerOptions::new().with_syntax(syntax);
    if args.patterns {
        options = options.with_patterns();
    }

    tracing::debug!(
        "analyzing: start=${:04X} entrypoints={} patterns={}",
        project.start_address,
        project.entrypoints.len(),
        args.patterns
    );

    let listing = analyze_project(&project, &options)?;

    if let Some(path) = &args.save_project {
        project
            .save(path)
            .with_context(|| format!("saving project to {}", path.display()))?;
    }

    match args.format {
        OutputFormat::Asm => {
            print!(
                "{}",
                m6502_classifier::formatter::render_listing(&listing.lines, &options.syntax)
            );
        }
        OutputFormat::Human => print_human(&project, &listing, &options.syntax, args.quiet),
        OutputFormat::Json => print_json(&project, &listing)?,
    }

    Ok(())
}

/// Build the project record from either a raw binary or a saved project.
fn load_inputs(args: &Args) -> anyhow::Result<Project> {
    if let Some(path) = &args.project {
        return Project::load(path).with_context(|| format!("loading {}", path.display()));
    }

    let path = args
        .file
        .as_ref()
        .context("an input file or --project is required")?;
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let (start, image) = if args.prg {
        if data.len() < 2 {
            bail!("{} is too short for a .prg load address", path.display());
        }
        (LittleEndian::read_u16(&data[..2]), data[2..].to_vec())
    } else {
        (args.start, data)
    };

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());

    Ok(Project::new(name, start, &image))
}

fn parse_hex_addr(s: &str) -> Result<u16, String> {
    let t = s.trim().trim_start_matches("0x").trim_start_matches('$');
    u16::from_str_radix(t, 16).map_err(|e| format!("invalid hex address {s:?}: {e}"))
}

fn parse_entry(spec: &str) -> anyhow::Result<Entrypoint> {
    let (addr_part, kind) = match spec.split_once(':') {
        Some((a, k)) => (a, k),
        None => (spec, "code"),
    };
    let address = parse_hex_addr(addr_part).map_err(anyhow::Error::msg)?;
    match kind {
        "code" => Ok(Entrypoint::code(address)),
        "data" => Ok(Entrypoint::data(address)),
        other => bail!("unknown entrypoint kind {other:?} (expected code or data)"),
    }
}

fn print_human(project: &Project, listing: &Listing, syntax: &Syntax, quiet: bool) {
    if !quiet {
        println!(
            "{}: {} bytes at ${:04X}, {} lines",
            project.name,
            listing.table.len(),
            project.start_address,
            listing.lines.len()
        );
    }

    for line in &listing.lines {
        if line.label.is_some() {
            if let Some(summary) = line.xref_summary() {
                println!("{:>30} {}", syntax.comment_prefix, summary);
            }
        }
        let bytes: Vec<String> = line.bytes.iter().map(|b| format!("{b:02X}")).collect();
        let label = line
            .label
            .as_ref()
            .map(|l| format!("{}{}", l, syntax.label_suffix))
            .unwrap_or_default();
        let mut row = format!(
            "{:04X}  {:<24} {:<10} {:<20}",
            line.address,
            bytes.join(" "),
            label,
            line.text
        );
        if let Some(comment) = &line.comment {
            row.push_str(&format!(" {} {}", syntax.comment_prefix, comment));
        }
        println!("{}", row.trim_end());
    }
}

fn print_json(project: &Project, listing: &Listing) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        name: &'a str,
        start_address: u16,
        length: usize,
        lines: &'a [OutputLine],
    }

    let output = JsonOutput {
        name: &project.name,
        start_address: project.start_address,
        length: listing.table.len(),
        lines: &listing.lines,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
