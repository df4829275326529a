//! scenepak CLI - Tool for inspecting and building scene archives.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use scenepak::archive::{Diagnostic, SignatureStatus};
use scenepak::prelude::*;
use tracing::{debug, info, trace};
use tracing_subscriber::EnvFilter;

const LEVEL_QUIET: &str = "error";
const LEVEL_INFO: &str = "info";
const LEVEL_DEBUG: &str = "debug";
const LEVEL_TRACE: &str = "trace";

/// Install the fmt subscriber. `RUST_LOG` wins over the command line level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = LEVEL_INFO;
    let mut config_path: Option<PathBuf> = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = LEVEL_DEBUG,
            "-vv" | "--trace" => level = LEVEL_TRACE,
            "-q" | "--quiet" => level = LEVEL_QUIET,
            "--config" => match iter.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => fail("--config needs a file argument"),
            },
            "-V" | "--version" => {
                print_version();
                return;
            }
            _ => filtered_args.push(arg),
        }
    }

    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let config = match &config_path {
        Some(path) => DecodeConfig::load(path).unwrap_or_else(|e| fail(&format!("{}: {}", path.display(), e))),
        None => DecodeConfig::load_default(),
    };
    trace!(?config, "decode configuration");

    match filtered_args[0] {
        // Info command - show archive summary
        "info" | "i" => {
            let path = require_arg(&filtered_args, 1, "scenepak info <file>");
            cmd_info(path);
        }

        // List command - record names, optionally filtered by type prefix
        "list" | "ls" | "l" => {
            let path = require_arg(&filtered_args, 1, "scenepak list <file> [type-prefix]");
            cmd_list(path, filtered_args.get(2).copied());
        }

        // Extract command - write one record to disk
        "extract" | "x" => {
            let path = require_arg(&filtered_args, 1, "scenepak extract <file> <record> [output]");
            let name = require_arg(&filtered_args, 2, "scenepak extract <file> <record> [output]");
            cmd_extract(path, name, filtered_args.get(3).copied());
        }

        // Verify command - check every record signature
        "verify" | "vf" => {
            let path = require_arg(&filtered_args, 1, "scenepak verify <file>");
            cmd_verify(path, &config);
        }

        // Pack command - build an archive from files
        "pack" | "p" => {
            let usage = "scenepak pack <output> [--compress] <files...>";
            let output = require_arg(&filtered_args, 1, usage);
            let compress = filtered_args.iter().any(|&s| s == "--compress" || s == "-c");
            let inputs: Vec<&str> = filtered_args[2..]
                .iter()
                .copied()
                .filter(|&s| s != "--compress" && s != "-c")
                .collect();
            if inputs.is_empty() {
                eprintln!("Error: no input files");
                eprintln!("Usage: {}", usage);
                std::process::exit(1);
            }
            cmd_pack(output, &inputs, compress);
        }

        // Help
        "help" | "h" | "-h" | "--help" => print_help(),

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0]);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn require_arg<'a>(args: &[&'a str], index: usize, usage: &str) -> &'a str {
    match args.get(index) {
        Some(&arg) => arg,
        None => {
            eprintln!("Error: missing argument");
            eprintln!("Usage: {}", usage);
            std::process::exit(1);
        }
    }
}

fn print_version() {
    println!(
        "scenepak {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("SCENEPAK_BUILD_DATE"),
        env!("SCENEPAK_BUILD_TIME")
    );
}

fn print_help() {
    println!("scenepak - scene archive toolkit");
    println!();
    println!("USAGE:");
    println!("    scenepak [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file>                     Show record counts, sizes and diagnostics");
    println!("    l, list    <file> [type-prefix]       List records, e.g. 'image/'");
    println!("    x, extract <file> <record> [output]   Write one record's bytes to disk");
    println!("    vf, verify <file>                     Check record signatures");
    println!("    p, pack    <output> [-c] <files...>   Build an archive (-c compresses)");
    println!("    h, help                               Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose      Show debug output");
    println!("    -vv, --trace       Show trace output (very verbose)");
    println!("    -q, --quiet        Only show errors");
    println!("    --config <file>    Decode configuration (JSON)");
    println!("    -V, --version      Show version");
    println!();
    println!("EXAMPLES:");
    println!("    scenepak info level.pak               # Quick overview");
    println!("    scenepak list level.pak image/        # All images");
    println!("    scenepak extract level.pak scene.json # Dump one record");
    println!("    scenepak pack out.pak -c a.json b.png # Build a compressed archive");
    println!();
    println!("NOTES:");
    println!("    - Passing an archive directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the -v/-q levels");
    if let Some(path) = DecodeConfig::default_path() {
        println!("    - Default config: {}", path.display());
    }
}

fn open_archive(path: &str) -> Archive {
    info!("Opening archive: {}", path);
    match Archive::open_path(path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &str) {
    let archive = open_archive(path);
    debug!("Archive opened successfully");

    let mut by_type: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
    let mut total = 0u64;
    let mut stored = 0u64;
    let mut compressed = 0usize;
    for record in archive.records() {
        let entry = by_type.entry(record.type_name()).or_default();
        entry.0 += 1;
        entry.1 += record.len() as u64;
        total += record.len() as u64;
        stored += record.compressed_size() as u64;
        if record.is_compressed() {
            compressed += 1;
        }
    }

    println!("Archive: {}", path);
    println!("Records: {} ({} compressed)", archive.len(), compressed);
    println!("Size:    {} bytes ({} stored)", total, stored);
    println!();
    println!("Types:");
    for (ty, (count, bytes)) in &by_type {
        println!("  {:<32} {:>5} records {:>10} bytes", ty, count, bytes);
    }

    if !archive.diagnostics().is_empty() {
        println!();
        println!("Dropped records:");
        for diag in archive.diagnostics() {
            match diag {
                Diagnostic::Truncated { name, offset, needed, available } => println!(
                    "  {} at offset {}: truncated, {} of {} bytes",
                    name.as_deref().unwrap_or("<header>"),
                    offset,
                    available,
                    needed
                ),
                Diagnostic::DecompressionMismatch { name, expected, actual } => println!(
                    "  {}: decompressed to {} bytes, expected {}",
                    name, actual, expected
                ),
            }
        }
    }
}

fn cmd_list(path: &str, prefix: Option<&str>) {
    let archive = open_archive(path);
    let names: Vec<String> = match prefix {
        Some(p) => archive.list_by_type_prefix(p),
        None => archive.names().map(str::to_string).collect(),
    };
    debug!("{} records match", names.len());

    for name in &names {
        if let Some(record) = archive.get(name) {
            println!(
                "{:<40} {:<28} {:>10} {}",
                record.name(),
                record.type_name(),
                record.len(),
                if record.is_compressed() { "lzw" } else { "-" }
            );
        }
    }
}

fn cmd_extract(path: &str, name: &str, output: Option<&str>) {
    let mut archive = open_archive(path);
    let Some(record) = archive.extract(name) else {
        fail(&format!("no record named '{}'", name));
    };

    let out = match output {
        Some(o) => PathBuf::from(o),
        None => Path::new(name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("record.bin")),
    };
    let len = record.len();
    if let Err(e) = std::fs::write(&out, record.into_bytes()) {
        fail(&format!("{}: {}", out.display(), e));
    }
    info!("Wrote {} bytes to {}", len, out.display());
}

fn cmd_verify(path: &str, config: &DecodeConfig) {
    let mut archive = open_archive(path);
    let verifier = config.verifier();
    let failures = archive.verify_all(&verifier);

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let names: Vec<String> = archive.names().map(str::to_string).collect();
    for name in &names {
        let Some(status) = archive.signature_status(name) else {
            continue;
        };
        *counts.entry(status.name()).or_default() += 1;
        if status != SignatureStatus::Missing {
            println!("{:<10} {}", status.name(), name);
        }
    }

    println!();
    for (status, count) in &counts {
        println!("{:<10} {}", status, count);
    }
    if failures > 0 {
        info!("{} records did not verify (advisory only)", failures);
    }
}

fn guess_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("json" | "sig") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn cmd_pack(output: &str, inputs: &[&str], compress: bool) {
    let mut writer = ArchiveWriter::new();
    for &input in inputs {
        let path = Path::new(input);
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => fail(&format!("{}: {}", input, e)),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(input);
        let ty = guess_type(path);
        debug!("Adding {} ({}, {} bytes)", name, ty, bytes.len());
        writer.add(name, ty, &bytes, compress);
    }

    if let Err(e) = writer.write_to(output) {
        fail(&format!("{}: {}", output, e));
    }
    info!("Wrote {} records to {}", writer.len(), output);
}
