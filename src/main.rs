//! CLI for rtfbook - HTML to RTF (and back) converter

use clap::{Parser, Subcommand};
use rtfbook::{Conversion, ConvertOptions, HtmlRtfConverter, UploadDirResolver};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an HTML page to RTF
    Encode {
        /// Input HTML file path
        input: PathBuf,

        /// Output RTF file path (optional, prints to stdout if not specified)
        output: Option<PathBuf>,

        /// Directory holding uploaded images referenced by <img src>
        #[arg(long)]
        uploads_dir: Option<PathBuf>,

        /// URL prefix under which the uploads directory is served
        #[arg(long, requires = "uploads_dir")]
        url_prefix: Option<String>,

        /// Maximum display width of embedded images in pixels
        #[arg(long, default_value_t = 400)]
        max_image_width: u32,
    },
    /// Convert an RTF document to HTML
    Decode {
        /// Input RTF file path
        input: PathBuf,

        /// Output HTML file path (optional, prints to stdout if not specified)
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let (report, output) = match args.command {
        Command::Encode {
            input,
            output,
            uploads_dir,
            url_prefix,
            max_image_width,
        } => {
            let mut options = ConvertOptions::default();
            options.image.max_image_width = max_image_width;

            let converter = match uploads_dir {
                Some(dir) => {
                    let mut resolver = UploadDirResolver::new(dir);
                    if let Some(prefix) = url_prefix {
                        resolver = resolver.with_url_prefix(prefix);
                    }
                    HtmlRtfConverter::new(options, resolver)
                }
                None => HtmlRtfConverter::new(options, rtfbook::DataUriResolver),
            };
            let html = read_input(&input);
            (converter.encode_with_report(&html), output)
        }
        Command::Decode { input, output } => {
            let converter = HtmlRtfConverter::with_defaults();
            let rtf = read_input(&input);
            (converter.decode_with_report(&rtf), output)
        }
    };

    write_output(report, output.as_deref());
}

fn read_input(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            // Legacy RTF and HTML carry raw 8-bit ANSI text.
            Err(e) => {
                let (text, _) =
                    encoding_rs::WINDOWS_1252.decode_without_bom_handling(e.as_bytes());
                text.into_owned()
            }
        },
        Err(e) => {
            eprintln!("Error reading {:?}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn write_output(report: Conversion, output: Option<&Path>) {
    for diagnostic in &report.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    if let Some(output) = output {
        if let Err(e) = std::fs::write(output, &report.output) {
            eprintln!("Error writing output: {}", e);
            std::process::exit(1);
        }
        println!("Successfully converted to {:?}", output);
    } else {
        println!("{}", report.output);
    }
}
