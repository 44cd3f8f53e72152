use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::config::Geometry;
use crate::constants::*;
use crate::error::InputError;
use crate::memory::FrameOccupant;
use crate::translation::TranslationResult;
use crate::vm_manager::VmManager;

/// Everything a run needs from the outside: geometry plus trace/report paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub geometry: Geometry,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            geometry: Geometry::default(),
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl RunSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a `key=value` properties file. Missing keys keep their defaults.
    pub fn parse(content: &str) -> Result<Self, InputError> {
        let mut settings = RunSettings::default();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(InputError::MalformedProperty {
                    line: line_no,
                    text: line.to_string(),
                });
            };
            let (key, value) = (key.trim(), value.trim());

            let number = || {
                value.parse::<u32>().map_err(|_| InputError::InvalidProperty {
                    line: line_no,
                    key: key.to_string(),
                    value: value.to_string(),
                })
            };

            let g = &mut settings.geometry;
            match key {
                "virtual_bits" => g.virtual_bits = number()?,
                "physical_bits" => g.physical_bits = number()?,
                "offset_bits" => g.offset_bits = number()?,
                "tlb_bits" => g.tlb_bits = number()?,
                "levels" => g.levels = number()?,
                "text_bits" => g.text_bits = number()?,
                "data_bits" => g.data_bits = number()?,
                "stack_bits" => g.stack_bits = number()?,
                "input_file" => settings.input_file = PathBuf::from(value),
                "output_file" => settings.output_file = PathBuf::from(value),
                _ => warn!("line {line_no}: ignoring unknown setting {key:?}"),
            }
        }

        Ok(settings)
    }
}

/// Parse one address per line; blank lines are skipped
pub fn parse_virtual_addresses(content: &str) -> Result<Vec<u64>, InputError> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, token)| {
            token.parse::<u64>().map_err(|_| InputError::InvalidAddress {
                line: line_no,
                token: token.to_string(),
            })
        })
        .collect()
}

pub fn read_virtual_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<u64>, InputError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_virtual_addresses(&content)
}

/// Render the full report: one line per translation, then the page table
/// and frame dumps.
pub fn render_report<W: Write>(
    out: &mut W,
    results: &[TranslationResult],
    vm: &VmManager,
    offset_bits: u32,
) -> std::io::Result<()> {
    for result in results {
        writeln!(out, "{result}")?;
    }

    writeln!(out)?;
    writeln!(out, "=== PAGE TABLE ===")?;
    for (vpn, entry) in vm.page_table().entries() {
        let frame = entry.frame().map_or(INVALID_FRAME, |frame| frame as i64);
        writeln!(out, "VPN={vpn} VALID={} FRAME={frame}", entry.is_valid())?;
    }

    writeln!(out)?;
    writeln!(out, "=== PHYSICAL MEMORY (FRAMES) ===")?;
    for (index, frame) in vm.frames().frames() {
        // a resident page is shown by the virtual address its page starts at
        let content = match frame.occupant {
            FrameOccupant::Free => FREE_FRAME_CONTENT,
            FrameOccupant::Page(vpn) => (vpn << offset_bits) as i64,
        };
        writeln!(out, "FRAME={index} CONTENT={content}")?;
    }

    Ok(())
}

pub fn write_report<P: AsRef<Path>>(
    path: P,
    results: &[TranslationResult],
    vm: &VmManager,
    offset_bits: u32,
) -> Result<(), InputError> {
    let path = path.as_ref();
    let to_error = |source| InputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut out = BufWriter::new(file);
    render_report(&mut out, results, vm, offset_bits).map_err(to_error)?;
    out.flush().map_err(to_error)
}
