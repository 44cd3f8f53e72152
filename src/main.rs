//! MMU simulator - Main Entry Point
//!
//! Usage: mmu-sim [OPTIONS]
//!
//! Reads one virtual address per line from the trace file, runs each through
//! the TLB / page table / frame allocator pipeline and writes a report with
//! one line per address followed by the final page table and frame dumps.
//!
//! Settings come from the built-in defaults, then an optional properties
//! file (`--config`), then individual command-line flags.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use mmu_sim::io::{read_virtual_addresses, render_report, write_report, RunSettings};
use mmu_sim::logger::{level_for_verbosity, StderrLogger};
use mmu_sim::{Config, Summary, Translator, VmManager};

#[derive(Parser, Debug)]
#[command(name = "mmu-sim")]
#[command(about = "Trace-driven MMU simulator: TLB, multi-level page table and LRU frame replacement")]
struct Args {
    /// Properties file with key=value settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace file with one virtual address per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Report file ("-" for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width of a virtual address in bits
    #[arg(long)]
    virtual_bits: Option<u32>,

    /// Width of a physical address in bits
    #[arg(long)]
    physical_bits: Option<u32>,

    /// Bits of page offset (page size = 2^bits)
    #[arg(long)]
    offset_bits: Option<u32>,

    /// log2 of the number of TLB entries
    #[arg(long)]
    tlb_bits: Option<u32>,

    /// Page table levels (1-3)
    #[arg(long)]
    levels: Option<u32>,

    /// log2 of the .text segment size
    #[arg(long)]
    text_bits: Option<u32>,

    /// log2 of the .data segment size
    #[arg(long)]
    data_bits: Option<u32>,

    /// log2 of the .stack segment size
    #[arg(long)]
    stack_bits: Option<u32>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Layer command-line overrides on top of the file/default settings
    fn settings(&self) -> Result<RunSettings> {
        let mut settings = match &self.config {
            Some(path) => RunSettings::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => RunSettings::default(),
        };

        let g = &mut settings.geometry;
        let overrides = [
            (self.virtual_bits, &mut g.virtual_bits),
            (self.physical_bits, &mut g.physical_bits),
            (self.offset_bits, &mut g.offset_bits),
            (self.tlb_bits, &mut g.tlb_bits),
            (self.levels, &mut g.levels),
            (self.text_bits, &mut g.text_bits),
            (self.data_bits, &mut g.data_bits),
            (self.stack_bits, &mut g.stack_bits),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }

        if let Some(input) = &self.input {
            settings.input_file = input.clone();
        }
        if let Some(output) = &self.output {
            settings.output_file = output.clone();
        }

        Ok(settings)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = StderrLogger::new(level_for_verbosity(args.verbose)).init() {
        eprintln!("warning: could not install logger: {e}");
    }

    // Run the simulator and report any error chain
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Main logic separated from main() for cleaner error handling
fn run(args: &Args) -> Result<()> {
    // Step 1: Resolve and validate the configuration
    let settings = args.settings()?;
    let config = Config::new(settings.geometry).context("invalid simulator configuration")?;

    info!("=== MMU Simulator ===");
    info!("Geometry:    {config}");
    info!("Input file:  {}", settings.input_file.display());
    info!("Output file: {}", settings.output_file.display());

    // Step 2: Build the MMU state
    let mut vm = VmManager::new(&config);
    let mut translator = Translator::new(&config);
    for (tag, range) in translator.layout().iter() {
        info!("Segment {tag:<7} [{}, {})", range.start, range.end);
    }

    // Step 3: Read the trace
    let addresses = read_virtual_addresses(&settings.input_file)
        .with_context(|| format!("reading trace {}", settings.input_file.display()))?;
    info!("Virtual addresses to translate: {}", addresses.len());

    // Step 4: Translate every address
    let results = translator
        .translate_trace(&mut vm, addresses)
        .context("translation aborted")?;

    let summary = Summary::from_results(&results);
    info!("=== Summary ===");
    info!("{summary}");
    info!(
        "Frames in use: {}/{}",
        vm.frames().len() - vm.frames().free_count(),
        vm.frames().len()
    );

    // Step 5: Write the report
    if settings.output_file.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        render_report(&mut stdout, &results, &vm, config.offset_bits())
            .and_then(|()| stdout.flush())
            .context("writing report to stdout")?;
    } else {
        write_report(&settings.output_file, &results, &vm, config.offset_bits())
            .with_context(|| format!("writing report {}", settings.output_file.display()))?;
        info!("Report written to: {}", settings.output_file.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::try_parse_from([
            "mmu-sim",
            "--levels",
            "2",
            "--tlb-bits",
            "4",
            "-i",
            "trace.txt",
            "-vv",
        ])
        .unwrap();

        let settings = args.settings().unwrap();
        assert_eq!(settings.geometry.levels, 2);
        assert_eq!(settings.geometry.tlb_bits, 4);
        assert_eq!(settings.geometry.virtual_bits, 16);
        assert_eq!(settings.input_file, PathBuf::from("trace.txt"));
        assert_eq!(settings.output_file, PathBuf::from("simulation_report.txt"));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["mmu-sim"]).unwrap();
        assert_eq!(args.settings().unwrap(), RunSettings::default());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_reject_unknown_flag() {
        assert!(Args::try_parse_from(["mmu-sim", "--frames", "3"]).is_err());
    }
}
