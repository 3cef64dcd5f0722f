//! Command line front end for peechy schemas.
//!
//! Usage:
//!   peechy check SCHEMA...
//!   peechy fmt [--write] SCHEMA
//!   peechy gen [-o FILE] [--crate-path PATH] SCHEMA
//!   peechy decode [--hex] SCHEMA TYPE FILE
//!
//! Logging goes to stderr; `-v` raises the level, `--log-filter` (or `PEECHY_LOG`, then `RUST_LOG`)
//! takes an `EnvFilter` directive string.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use peechy::{dump_value, generate_rust, parse_file, pretty_print, Codec, GeneratorOptions, ResolvedSchema};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "peechy", author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log filter directives, e.g. `peechy=debug`.
    #[arg(long, env = "PEECHY_LOG", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and verify schema files.
    Check {
        #[arg(required = true)]
        schemas: Vec<PathBuf>,
    },
    /// Print a schema in canonical form.
    Fmt {
        schema: PathBuf,
        /// Rewrite the file in place instead of printing.
        #[arg(short, long)]
        write: bool,
    },
    /// Generate Rust types with encode/decode methods.
    Gen {
        schema: PathBuf,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Path the generated code imports `ByteBuffer` from.
        #[arg(long, default_value = "peechy")]
        crate_path: String,
    },
    /// Decode a binary payload as the named definition and dump it.
    Decode {
        schema: PathBuf,
        #[arg(value_name = "TYPE")]
        type_name: String,
        file: PathBuf,
        /// Input is hex text (whitespace ignored) instead of raw bytes.
        #[arg(long)]
        hex: bool,
    },
}

fn init_logging(verbose: u8, filter: Option<String>) {
    let default_level = match verbose {
        0 => "peechy=warn",
        1 => "peechy=info",
        2 => "peechy=debug",
        _ => "peechy=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().parse_lossy(
            filter
                .or_else(|| std::env::var("RUST_LOG").ok())
                .unwrap_or_else(|| default_level.to_owned()),
        ))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> anyhow::Result<ResolvedSchema> {
    let schema = parse_file(path).with_context(|| format!("{}", path.display()))?;
    let resolved = ResolvedSchema::resolve(schema).with_context(|| format!("{}", path.display()))?;
    Ok(resolved)
}

fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).context("hex input is not ASCII")?;
            u8::from_str_radix(s, 16).with_context(|| format!("invalid hex byte {:?}", s))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_filter.clone());

    match cli.command {
        Command::Check { schemas } => {
            for path in &schemas {
                let resolved = load(path)?;
                info!(path = %path.display(), definitions = resolved.definitions().len(), "schema ok");
                println!("{}: ok", path.display());
            }
        }
        Command::Fmt { schema, write } => {
            let resolved = load(&schema)?;
            let text = pretty_print(&resolved.schema);
            if write {
                std::fs::write(&schema, &text).with_context(|| format!("writing {}", schema.display()))?;
                info!(path = %schema.display(), "formatted");
            } else {
                print!("{}", text);
            }
        }
        Command::Gen {
            schema,
            output,
            crate_path,
        } => {
            let resolved = load(&schema)?;
            let code = generate_rust(&resolved, &GeneratorOptions { crate_path });
            match output {
                Some(out) => {
                    std::fs::write(&out, &code).with_context(|| format!("writing {}", out.display()))?;
                    info!(path = %out.display(), bytes = code.len(), "generated");
                }
                None => print!("{}", code),
            }
        }
        Command::Decode {
            schema,
            type_name,
            file,
            hex,
        } => {
            let resolved = load(&schema)?;
            let raw = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let bytes = if hex {
                let text = String::from_utf8(raw).context("hex input is not UTF-8")?;
                parse_hex(&text)?
            } else {
                raw
            };
            debug!(bytes = bytes.len(), %type_name, "decoding");
            let codec = Codec::new(resolved);
            let value = codec
                .decode(&type_name, &bytes)
                .with_context(|| format!("decoding {} from {}", type_name, file.display()))?;
            println!("{}", dump_value(&value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_ignores_whitespace() {
        assert_eq!(parse_hex("01 ff\n0a").unwrap(), vec![0x01, 0xff, 0x0a]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["peechy", "-vv", "gen", "a.peechy", "-o", "out.rs"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Gen { output, crate_path, .. } => {
                assert_eq!(output, Some(PathBuf::from("out.rs")));
                assert_eq!(crate_path, "peechy");
            }
            _ => panic!("expected gen"),
        }
    }
}
