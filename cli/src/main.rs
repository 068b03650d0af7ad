//! pdfweave CLI - interleave PDF text with image placeholders

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfweave::assemble::{collect_page_images, extract_text_pages};
use pdfweave::render;
use pdfweave::{
    AssembleOptions, Assembler, AssemblyStats, DocumentSource, JsonFormat, PageSelection,
    PdfSource,
};

#[derive(Parser)]
#[command(name = "pdfweave")]
#[command(version)]
#[command(about = "Interleave PDF page text with deduplicated image placeholders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble text with image placeholders and the image manifest as JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Disable the parallel strategy
        #[arg(long)]
        sequential: bool,

        /// Fail on the first unreadable page instead of keeping its images
        #[arg(long)]
        strict: bool,

        /// Also write manifest images to this directory
        #[arg(long, value_name = "DIR")]
        images_dir: Option<PathBuf>,
    },

    /// Extract plain page text without placeholders
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Write every page's images to disk, one file per page occurrence
    Images {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show document information and placeholder statistics
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
            pages,
            sequential,
            strict,
            images_dir,
        } => cmd_extract(
            &input,
            output.as_deref(),
            compact,
            pages.as_deref(),
            sequential,
            strict,
            images_dir.as_deref(),
        ),
        Commands::Text {
            input,
            output,
            pages,
            json,
        } => cmd_text(&input, output.as_deref(), pages.as_deref(), json),
        Commands::Images {
            input,
            output,
            pages,
        } => cmd_images(&input, output.as_deref(), pages.as_deref()),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, String> {
    match pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e)),
        None => Ok(PageSelection::All),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    pages: Option<&str>,
    sequential: bool,
    strict: bool,
    images_dir: Option<&Path>,
) -> CliResult {
    let mut options = AssembleOptions::new()
        .with_pages(page_selection(pages)?)
        .with_parallel(!sequential);
    if !strict {
        options = options.lenient();
    }

    let pb = spinner("Assembling pages...");
    let source = PdfSource::open(input)?;
    let result = Assembler::new(options).assemble(&source)?;
    pb.finish_and_clear();

    if let Some(dir) = images_dir {
        let written = render::write_manifest(&result, dir)?;
        eprintln!(
            "{} {} images to {}",
            "Wrote".green(),
            written.len(),
            dir.display()
        );
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    write_or_print(output, &render::to_json(&result, format)?)
}

fn cmd_text(input: &Path, output: Option<&Path>, pages: Option<&str>, json: bool) -> CliResult {
    // Lenient so one bad page does not hide the rest
    let options = AssembleOptions::new()
        .lenient()
        .with_pages(page_selection(pages)?);
    let source = PdfSource::open(input)?;
    let doc = extract_text_pages(&source, &options)?;

    let content = if json {
        render::text_to_json(&doc, JsonFormat::Pretty)?
    } else {
        render::text_document_to_string(&doc)
    };
    write_or_print(output, &content)
}

fn cmd_images(input: &Path, output: Option<&Path>, pages: Option<&str>) -> CliResult {
    let options = AssembleOptions::new()
        .lenient()
        .with_pages(page_selection(pages)?);

    let pb = spinner("Extracting images...");
    let source = PdfSource::open(input)?;
    let listing = collect_page_images(&source, &options)?;
    pb.finish_and_clear();

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    for path in render::write_listing(&listing, &output_dir)? {
        if let Some(name) = path.file_name() {
            println!("{} {}", "Extracted".green(), name.to_string_lossy());
        }
    }

    println!(
        "\n{} {} images extracted",
        "Done!".green().bold(),
        listing.image_count()
    );
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> CliResult {
    let source = PdfSource::open(input)?;
    // Lenient: metadata is still worth showing when some pages are broken
    let result = Assembler::new(AssembleOptions::new().lenient()).assemble(&source)?;
    let stats = AssemblyStats::from_result(&result);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let metadata = source.metadata();
    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }

    println!();
    println!("{}", "Assembly Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), stats.words);
    println!("{}: {}", "Distinct images".bold(), stats.images);
    println!("{}: {}", "Image placeholders".bold(), stats.image_placeholders);
    println!("{}: {}", "Failed images".bold(), stats.error_placeholders);
    println!("{}: {}", "Inline images".bold(), stats.inline_placeholders);
    println!(
        "{}: {}",
        "Payload size".bold(),
        format_bytes(result.payload_size())
    );

    Ok(())
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_selection_arg() {
        assert_eq!(page_selection(None).unwrap(), PageSelection::All);
        assert_eq!(
            page_selection(Some("2-4")).unwrap(),
            PageSelection::Range(2..=4)
        );
        assert!(page_selection(Some("0")).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_write_or_print_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_or_print(Some(&path), "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_cli_parses_extract() {
        let cli = Cli::parse_from([
            "pdfweave",
            "extract",
            "doc.pdf",
            "--compact",
            "--sequential",
            "--images-dir",
            "imgs",
        ]);
        match cli.command {
            Commands::Extract {
                compact,
                sequential,
                images_dir,
                ..
            } => {
                assert!(compact);
                assert!(sequential);
                assert_eq!(images_dir, Some(PathBuf::from("imgs")));
            }
            _ => panic!("expected extract"),
        }
    }
}
