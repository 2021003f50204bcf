//! CLI tool for turning documents and text into speech.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use speak_core::{Prosody, SpeechPipeline, TextNormalizer, TextSource, VoiceCatalog};
use speak_documents::default_parsers;
use speak_drive::DriveClient;
use speak_edge::EdgeClient;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Convert text, PDF and DOCX documents to speech with Edge TTS voices.
#[derive(Parser, Debug)]
#[command(name = "speak")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available voices
    Voices {
        /// Only show voices for this locale (e.g. es-MX)
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// List the locales voices are available in
    Locales,

    /// Extract and clean the text of a document without synthesizing it
    Normalize {
        /// Input document (.pdf, .docx or text)
        input: PathBuf,

        /// Write the text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize speech and write an MP3 file
    Synth(SynthArgs),
}

#[derive(clap::Args, Debug)]
struct SynthArgs {
    /// Voice name, short (en-US-AriaNeural) or full
    #[arg(long)]
    voice: String,

    #[command(flatten)]
    input: InputArgs,

    /// Output file or directory (default: audio_<voice>.mp3 in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Speaking rate change, e.g. +10% or -20%
    #[arg(long, default_value = "+0%", allow_hyphen_values = true)]
    rate: String,

    /// Volume change, e.g. +10% or -20%
    #[arg(long, default_value = "+0%", allow_hyphen_values = true)]
    volume: String,

    /// Pitch change, e.g. +5Hz or -5Hz
    #[arg(long, default_value = "+0Hz", allow_hyphen_values = true)]
    pitch: String,

    /// Print the text that will be spoken before synthesizing
    #[arg(long)]
    print_text: bool,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Text to speak ("-" reads stdin)
    #[arg(short, long)]
    text: Option<String>,

    /// Document to speak (.pdf, .docx or text)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Public Google Drive or Google Docs link
    #[arg(short, long)]
    link: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Voices { locale } => list_voices(locale.as_deref()),
        Command::Locales => list_locales(),
        Command::Normalize { input, output } => normalize_file(&input, output.as_deref()),
        Command::Synth(synth) => synthesize(&synth, args.verbose),
    }
}

fn voice_catalog() -> Result<VoiceCatalog<EdgeClient>> {
    Ok(VoiceCatalog::new(EdgeClient::new()?))
}

/// Print voices, optionally for a single locale.
fn list_voices(locale: Option<&str>) -> Result<()> {
    let catalog = voice_catalog()?;
    let voices = catalog
        .by_locale(locale)
        .context("Failed to fetch the voice list")?;

    if voices.is_empty() {
        bail!("No voices found for locale {}", locale.unwrap_or("(any)"));
    }

    let mut stdout = io::stdout().lock();
    for voice in voices {
        writeln!(stdout, "{:<40} {}", voice.short_name, voice.display_label())?;
    }

    Ok(())
}

/// Print the distinct voice locales.
fn list_locales() -> Result<()> {
    let catalog = voice_catalog()?;
    let locales = catalog.locales().context("Failed to fetch the voice list")?;

    let mut stdout = io::stdout().lock();
    for locale in locales {
        writeln!(stdout, "{}", locale)?;
    }

    Ok(())
}

/// Extract and normalize a document, printing or saving the text.
fn normalize_file(input: &Path, output: Option<&Path>) -> Result<()> {
    let (filename, bytes) = read_document(input)?;
    let document = default_parsers()
        .extract(&bytes, &filename)
        .with_context(|| format!("Failed to extract text from {}", input.display()))?;

    log::debug!("Parsed {} as {}", filename, document.format);

    let text = TextNormalizer::new().normalize(&document.text);

    match output {
        Some(path) => write_output(path, format!("{}\n", text).as_bytes()),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Resolve the input, synthesize it and write the MP3.
fn synthesize(args: &SynthArgs, verbose: bool) -> Result<()> {
    let prosody = Prosody::new(&args.rate, &args.volume, &args.pitch)?;
    let source = resolve_source(&args.input)?;

    let pipeline = SpeechPipeline::new(default_parsers(), EdgeClient::new()?);

    let text = pipeline.prepare_text(&source)?;
    if args.print_text {
        println!("{}", text);
    }
    if verbose {
        eprintln!("  Speaking {} characters with {}", text.chars().count(), args.voice);
    }

    let clip = pipeline
        .speak(&text, &args.voice, &prosody)
        .context("Speech synthesis failed")?;

    let output_path = get_output_path(args.output.as_deref(), &clip.file_name)?;
    write_output(&output_path, &clip.bytes)?;

    eprintln!("Written to: {}", output_path.display());
    Ok(())
}

/// Turn the mutually exclusive input flags into a text source.
fn resolve_source(input: &InputArgs) -> Result<TextSource> {
    if let Some(text) = &input.text {
        let text = if text == "-" {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        } else {
            text.clone()
        };
        return Ok(TextSource::Typed(text));
    }

    if let Some(path) = &input.file {
        let (filename, bytes) = read_document(path)?;
        return Ok(TextSource::document(filename, bytes));
    }

    if let Some(link) = &input.link {
        let document = DriveClient::new()?
            .fetch_url(link)
            .with_context(|| format!("Failed to download {}", link))?;
        return Ok(document.into());
    }

    bail!("One of --text, --file or --link is required")
}

/// Read a document and its bare file name.
fn read_document(path: &Path) -> Result<(String, Vec<u8>)> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok((filename, bytes))
}

/// Determine where the audio goes.
fn get_output_path(output: Option<&Path>, file_name: &str) -> Result<PathBuf> {
    let output_path = match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            path.to_path_buf()
        }
        None => PathBuf::from(file_name),
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
