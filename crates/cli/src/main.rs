//! Binary entry point for the subtitle split/correct/merge toolkit.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use subfix_core::chunk::{chunk_entries, DEFAULT_CHUNK_SIZE};
use subfix_core::correct::{
    correct_all, pair_files, gemini::GeminiCorrector, ProjectOutcome, ReferenceConfig,
    DEFAULT_WAVE_SIZE,
};
use subfix_core::diff::{align, DiffSpan, SpanKind};
use subfix_core::merge::{merge_chunk, merge_files, SrtFile};
use subfix_core::srt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split an SRT file into numbered structure/text chunk files.
    Split {
        /// Path to the SRT file to split.
        input: PathBuf,

        /// Maximum number of entries per chunk.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Directory the chunk files are written to.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Run the Gemini corrector over paired chunk files.
    Correct {
        /// Structure and text files produced by `split`.
        inputs: Vec<PathBuf>,

        /// Character name the corrector must preserve; repeatable.
        #[arg(long = "character")]
        characters: Vec<String>,

        /// Movie title to wrap in angle brackets; repeatable.
        #[arg(long = "movie")]
        movies: Vec<String>,

        /// Reference document inlined into the prompt; repeatable.
        #[arg(long = "reference")]
        references: Vec<PathBuf>,

        /// Number of projects corrected concurrently per wave.
        #[arg(long, default_value_t = DEFAULT_WAVE_SIZE)]
        wave_size: usize,

        /// Gemini model name.
        #[arg(long)]
        model: Option<String>,

        /// Print a side-by-side diff of each corrected project.
        #[arg(long)]
        review: bool,

        /// Directory the corrected SRT files are written to.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Recombine one structure file with a corrected text file.
    Recombine {
        /// The `{id}_num&timecodes.txt` structure file.
        structure: PathBuf,

        /// The corrected `{id}_text.txt` file.
        text: PathBuf,

        /// Output SRT path; defaults to the structure file's id.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge several SRT files into one, renumbering globally.
    Merge {
        /// SRT files in the order they should be concatenated.
        inputs: Vec<PathBuf>,

        /// Output path for the merged SRT file.
        #[arg(long, default_value = "merged.srt")]
        output: PathBuf,
    },

    /// Show a side-by-side diff between an original and a corrected text.
    Diff {
        original: PathBuf,
        corrected: PathBuf,
    },
}

/// Application entry point which parses CLI args and performs actions.
/// This function should initialize logging and delegate to the core library.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subfix=trace".parse().unwrap())
            .add_directive("subfix_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("subfix=info".parse().unwrap())
            .add_directive("subfix_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Split {
            input,
            chunk_size,
            out_dir,
        } => split(&input, chunk_size, out_dir),
        Command::Correct {
            inputs,
            characters,
            movies,
            references,
            wave_size,
            model,
            review,
            out_dir,
        } => {
            let config = ReferenceConfig {
                characters,
                movies,
                documents: references,
            };
            correct(inputs, &config, wave_size, model, review, out_dir).await
        }
        Command::Recombine {
            structure,
            text,
            output,
        } => recombine(&structure, &text, output),
        Command::Merge { inputs, output } => merge(&inputs, &output),
        Command::Diff {
            original,
            corrected,
        } => diff(&original, &corrected),
    }
}

/// Split an SRT file into chunk artifact files on disk.
fn split(input: &Path, chunk_size: usize, out_dir: Option<PathBuf>) -> Result<()> {
    if !input
        .extension()
        .map(|e| e.eq_ignore_ascii_case("srt"))
        .unwrap_or(false)
    {
        return Err(anyhow!("{} is not an SRT file", input.display()));
    }
    let content = fs::read_to_string(input)?;
    let entries = srt::parse_entries(&content);
    if entries.is_empty() {
        return Err(anyhow!("no valid subtitle entries in {}", input.display()));
    }
    info!("parsed {} entries", entries.len());
    let out_dir = out_dir.unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")).to_path_buf());
    fs::create_dir_all(&out_dir)?;
    let chunks = chunk_entries(&entries, chunk_size);
    for chunk in &chunks {
        fs::write(out_dir.join(&chunk.structure_file_name), &chunk.structure_content)?;
        fs::write(out_dir.join(&chunk.text_file_name), &chunk.text_content)?;
        info!(
            "wrote chunk {} covering entries {}-{}",
            chunk.id, chunk.index_start, chunk.index_end
        );
    }
    Ok(())
}

/// Pair the inputs into projects, run the corrector and write the results.
async fn correct(
    inputs: Vec<PathBuf>,
    config: &ReferenceConfig,
    wave_size: usize,
    model: Option<String>,
    review: bool,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let projects = pair_files(inputs);
    if projects.is_empty() {
        return Err(anyhow!("no pairable chunk files given"));
    }
    info!("paired {} projects", projects.len());
    let corrector = GeminiCorrector::new(model)?;
    let reports = correct_all(&projects, corrector, config, wave_size).await;

    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)?;
    let mut failures = 0usize;
    for report in &reports {
        match &report.outcome {
            ProjectOutcome::Completed {
                original_text,
                corrected_text,
                final_srt,
            } => {
                if review {
                    println!("--- project {} ---", report.id);
                    print_diff(original_text, corrected_text);
                }
                let path = out_dir.join(format!("{}_corrected.srt", report.id));
                fs::write(&path, final_srt)?;
                info!("wrote {}", path.display());
            }
            ProjectOutcome::Failed { message } => {
                failures += 1;
                warn!("project {} failed: {message}", report.id);
            }
        }
    }
    if failures > 0 {
        warn!("{failures} of {} projects failed; rerun to retry them", reports.len());
    }
    Ok(())
}

/// Offline recombination of one structure/text pair.
fn recombine(structure: &Path, text: &Path, output: Option<PathBuf>) -> Result<()> {
    let structure_content = fs::read_to_string(structure)?;
    let text_content = fs::read_to_string(text)?;
    let merged = merge_chunk(&structure_content, &text_content);
    let output = output.unwrap_or_else(|| {
        let stem = structure
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = stem.split('_').next().unwrap_or("recombined");
        structure.with_file_name(format!("{id}_recombined.srt"))
    });
    fs::write(&output, merged)?;
    info!("wrote {}", output.display());
    Ok(())
}

/// Merge several SRT files, skipping unsupported inputs with a warning.
fn merge(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let mut files = Vec::new();
    for input in inputs {
        if !input
            .extension()
            .map(|e| e.eq_ignore_ascii_case("srt"))
            .unwrap_or(false)
        {
            warn!("skipping {}: not an SRT file", input.display());
            continue;
        }
        let content = fs::read_to_string(input)?;
        let blocks = srt::parse_blocks(&content);
        if blocks.is_empty() {
            warn!("skipping {}: no valid blocks", input.display());
            continue;
        }
        files.push(SrtFile {
            name: input.display().to_string(),
            blocks,
        });
    }
    if files.is_empty() {
        return Err(anyhow!("no mergeable SRT files given"));
    }
    let merged = merge_files(&files);
    fs::write(output, merged)?;
    info!("merged {} files into {}", files.len(), output.display());
    Ok(())
}

/// Print a side-by-side diff of two text files.
fn diff(original: &Path, corrected: &Path) -> Result<()> {
    let original = fs::read_to_string(original)?;
    let corrected = fs::read_to_string(corrected)?;
    print_diff(&original, &corrected);
    Ok(())
}

fn print_diff(original: &str, corrected: &str) {
    for (i, row) in align(original, corrected).iter().enumerate() {
        let marker = if row.changed { '*' } else { ' ' };
        println!(
            "{:>4}{} {} | {}",
            i + 1,
            marker,
            render_spans(&row.left),
            render_spans(&row.right)
        );
    }
}

/// Render one side of a diff row with textual edit markers.
/// Deletions come out as `[-…]`, insertions as `{+…+}`, each followed by
/// its superscript change-group id.
fn render_spans(spans: &[DiffSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.kind {
            SpanKind::Unchanged => out.push_str(&span.text),
            SpanKind::Deleted => {
                out.push_str("[-");
                out.push_str(&span.text);
                out.push_str(&group_marker(span.change_id));
                out.push(']');
            }
            SpanKind::Inserted => {
                out.push_str("{+");
                out.push_str(&span.text);
                out.push_str(&group_marker(span.change_id));
                out.push_str("+}");
            }
        }
    }
    out
}

fn group_marker(id: Option<u32>) -> String {
    const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    match id {
        Some(id) => id
            .to_string()
            .bytes()
            .map(|b| DIGITS[(b - b'0') as usize])
            .collect(),
        None => String::new(),
    }
}
