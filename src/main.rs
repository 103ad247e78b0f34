use anyhow::Context;
use clap::{Parser, Subcommand};
use hushpix::{CarrierConfig, HushpixStego};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hushpix - hide a secret inside a synthetic image
///
/// Encoding writes a fresh 720x720 image named enc_XXXXXXXXXX.<ext>; decoding
/// needs nothing but that file.
#[derive(Parser)]
#[command(name = "hushpix")]
#[command(version)]
#[command(about = "Steganographic secret store", long_about = None)]
struct Cli {
    /// Log pipeline stages (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a secret in a new carrier image
    Encode {
        /// Secret text (read from stdin when neither --secret nor --file is given)
        #[arg(short, long, conflicts_with = "file")]
        secret: Option<String>,

        /// Read the secret from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Directory to write the carrier into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Lossless image format: png, bmp or tiff
        #[arg(short, long, default_value = "png")]
        ext: String,
    },
    /// Recover the secret from a carrier image
    Decode {
        /// Carrier image path
        file: PathBuf,
    },
    /// List carrier images in a directory
    List {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        #[arg(short, long, default_value = "png")]
        ext: String,
    },
    /// Delete a carrier image
    Delete {
        file: PathBuf,
    },
    /// Show the voted header of a carrier without decrypting
    Inspect {
        file: PathBuf,
    },
}

fn print_banner() {
    eprintln!("╔══════════════════════════════════════════╗");
    eprintln!("║   Hushpix Steganographic Secret Store    ║");
    eprintln!("╚══════════════════════════════════════════╝");
    eprintln!();
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "hushpix=debug" } else { "hushpix=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_secret(secret: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(secret) = secret {
        return Ok(secret);
    }
    if let Some(path) = file {
        eprintln!("[*] Reading secret from file: {}", path.display());
        return fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()));
    }
    eprintln!("[*] Reading secret from stdin (end with Ctrl-D)");
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    // Drop the newline a terminal or `echo` appends
    Ok(buf.trim_end_matches(['\n', '\r']).to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    print_banner();

    match cli.command {
        Commands::Encode { secret, file, dir, ext } => {
            let secret = read_secret(secret, file)?;
            let config = CarrierConfig {
                file_extension: ext,
                ..CarrierConfig::default()
            };
            let stego = HushpixStego::with_config(config)?;

            eprintln!("[*] Secret size: {} bytes", secret.len());
            eprintln!("[*] Embedding into a new {} carrier...", stego.config().file_extension);
            let path = stego.encode_to_dir(&secret, &dir)?;
            eprintln!("[✓] Success! Secret hidden.");
            println!("{}", path.display());
        }

        Commands::Decode { file } => {
            eprintln!("[*] Decoding carrier: {}", file.display());
            let decoded = hushpix::decode(&file)?;
            println!("{}", decoded.secret);

            if let Some(validity) = decoded.digest_validity {
                eprintln!("[*] Digest validity: {validity:.1}%");
            }
            if decoded.is_clean() {
                eprintln!("[✓] Integrity verified");
            } else {
                for warning in &decoded.warnings {
                    eprintln!("[!] {warning}");
                }
            }
        }

        Commands::List { dir, ext } => {
            let config = CarrierConfig::default();
            let files = hushpix::store::list_candidates(&dir, &config.file_prefix, &ext)?;
            if files.is_empty() {
                eprintln!("[*] No carrier files in {}", dir.display());
            }
            for path in files {
                println!("{}", path.display());
            }
        }

        Commands::Delete { file } => {
            hushpix::delete_candidate(&file)?;
            eprintln!("[✓] Deleted {}", file.display());
        }

        Commands::Inspect { file } => {
            let stego = HushpixStego::for_path(&file)?;
            let header = stego.inspect(&file)?;

            println!("╔═══════════════════════════════════════╗");
            println!("║         Carrier Header:               ║");
            println!("╠═══════════════════════════════════════╣");
            println!("║ Length copies: {:?}", header.length_copies);
            println!("║ Resolved length: {:?}", header.length);
            println!("║ Salt: {}", String::from_utf8_lossy(&header.salt));
            println!("║ IV: {}", hex::encode(header.iv));
            println!("║ Salt repaired: {}", header.salt_repaired);
            println!("║ IV repaired: {}", header.iv_repaired);
            println!("╚═══════════════════════════════════════╝");
        }
    }

    Ok(())
}
