//! Tabix header fields and the per-line coordinate decoding they drive.

use std::fmt::{self, Display};

use locidx_core::coords::{clamp_to_u32, one_based_closed_to_half_open};

use crate::errors::{Result, TabixError};

/// Bit of `preset` marking zero-based begin columns
pub const ZERO_BASED_FLAG: i32 = 0x10000;

/// Record layout named by the low 16 bits of `preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabixFormat {
    /// Tab-delimited with explicit sequence, begin and end columns
    Generic,
    /// SAM: end derived from the CIGAR string
    Sam,
    /// VCF: end derived from `REF`, overridden by an `END=` INFO entry
    Vcf,
}

impl TabixFormat {
    pub fn from_preset(preset: i32) -> Result<Self> {
        match preset & 0xffff {
            0 => Ok(TabixFormat::Generic),
            1 => Ok(TabixFormat::Sam),
            2 => Ok(TabixFormat::Vcf),
            other => Err(TabixError::InvalidHeader(format!(
                "unknown format code {} in preset {:#x}",
                other, preset
            ))),
        }
    }
}

impl Display for TabixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TabixFormat::Generic => "generic",
            TabixFormat::Sam => "SAM",
            TabixFormat::Vcf => "VCF",
        };
        write!(f, "{}", name)
    }
}

///
/// Format metadata stored at the top of a `.tbi` file. Column numbers are
/// one-based, `end_col == 0` means the format has no end column.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabixHeader {
    pub preset: i32,
    pub format: TabixFormat,
    pub zero_based: bool,
    pub seq_col: usize,
    pub begin_col: usize,
    pub end_col: usize,
    pub meta_char: char,
    pub skip_lines: usize,
}

impl TabixHeader {
    /// Validate raw header fields as they appear on disk.
    pub fn from_raw(
        preset: i32,
        seq_col: i32,
        begin_col: i32,
        end_col: i32,
        meta: i32,
        skip: i32,
    ) -> Result<Self> {
        let format = TabixFormat::from_preset(preset)?;

        let column = |value: i32, name: &str, min: i32| -> Result<usize> {
            if value < min {
                return Err(TabixError::InvalidHeader(format!("{} is {}", name, value)));
            }
            Ok(value as usize)
        };

        let meta_char = u8::try_from(meta)
            .map(char::from)
            .map_err(|_| TabixError::InvalidHeader(format!("meta character is {}", meta)))?;

        Ok(TabixHeader {
            preset,
            format,
            zero_based: preset & ZERO_BASED_FLAG != 0,
            seq_col: column(seq_col, "sequence column", 1)?,
            begin_col: column(begin_col, "begin column", 1)?,
            end_col: column(end_col, "end column", 0)?,
            meta_char,
            skip_lines: column(skip, "skip line count", 0)?,
        })
    }

    /// Header of a bgzipped VCF, as `tabix -p vcf` writes it.
    pub fn vcf() -> Self {
        TabixHeader {
            preset: 2,
            format: TabixFormat::Vcf,
            zero_based: false,
            seq_col: 1,
            begin_col: 2,
            end_col: 0,
            meta_char: '#',
            skip_lines: 0,
        }
    }

    /// Header of a bgzipped BED file, as `tabix -p bed` writes it.
    pub fn bed() -> Self {
        TabixHeader {
            preset: ZERO_BASED_FLAG,
            format: TabixFormat::Generic,
            zero_based: true,
            seq_col: 1,
            begin_col: 2,
            end_col: 3,
            meta_char: '#',
            skip_lines: 0,
        }
    }

    pub fn is_meta(&self, line: &str) -> bool {
        line.starts_with(self.meta_char)
    }

    ///
    /// Decode the sequence and half-open span of one data line.
    ///
    /// `resolve` maps the sequence column to a sequence id. Unknown sequences
    /// decode to `tid: None` rather than failing.
    ///
    pub fn decode_record<F>(&self, line: &str, resolve: F) -> Result<RecordInterval>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let fields: Vec<&str> = line.split('\t').collect();
        let field = |col: usize| {
            col.checked_sub(1)
                .and_then(|idx| fields.get(idx).copied())
                .ok_or_else(|| {
                    TabixError::InvalidRecord(format!("missing column {} in '{}'", col, line))
                })
        };
        let number = |col: usize, text: &str| -> Result<i64> {
            text.trim().parse::<i64>().map_err(|_| {
                TabixError::InvalidRecord(format!(
                    "column {} is not a number ('{}') in '{}'",
                    col, text, line
                ))
            })
        };

        let tid = resolve(field(self.seq_col)?);

        let pos = number(self.begin_col, field(self.begin_col)?)?;
        let (begin, end) = if self.zero_based {
            (clamp_to_u32(pos), clamp_to_u32(pos.saturating_add(1)))
        } else {
            one_based_closed_to_half_open(pos, pos)
        };
        let mut end = i64::from(end.max(1));

        match self.format {
            TabixFormat::Generic => {
                if self.end_col > 0 && self.end_col != self.begin_col && self.end_col != self.seq_col {
                    end = number(self.end_col, field(self.end_col)?)?;
                }
            }
            TabixFormat::Sam => {
                if let Some(cigar) = fields.get(5) {
                    end = i64::from(begin).saturating_add(reference_length(cigar, line)?);
                }
            }
            TabixFormat::Vcf => {
                if let Some(reference) = fields.get(3).filter(|r| !r.is_empty()) {
                    end = i64::from(begin) + reference.len() as i64;
                }
                if let Some(info) = fields.get(7) {
                    if let Some(value) = info_end(info) {
                        end = number(8, value)?;
                    }
                }
            }
        }

        Ok(RecordInterval {
            tid,
            begin,
            end: clamp_to_u32(end),
        })
    }
}

/// The `END=` value of a VCF INFO column, if any
fn info_end(info: &str) -> Option<&str> {
    info.split(';')
        .find_map(|entry| entry.strip_prefix("END="))
}

/// Reference bases consumed by a CIGAR string (`M`, `D`, `N`, `=`, `X` operations)
fn reference_length(cigar: &str, line: &str) -> Result<i64> {
    if cigar == "*" {
        return Ok(0);
    }
    let malformed = || TabixError::InvalidRecord(format!("malformed CIGAR '{}' in '{}'", cigar, line));

    let mut total = 0i64;
    let mut len_start = 0;
    for (idx, op) in cigar.char_indices() {
        if op.is_ascii_digit() {
            continue;
        }
        let len: i64 = cigar[len_start..idx].parse().map_err(|_| malformed())?;
        if matches!(op, 'M' | 'D' | 'N' | '=' | 'X') {
            total = total.checked_add(len).ok_or_else(malformed)?;
        }
        len_start = idx + op.len_utf8();
    }
    if len_start != cigar.len() {
        return Err(malformed());
    }
    Ok(total)
}

/// Where a data line sits: sequence id and half-open span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInterval {
    pub tid: Option<usize>,
    pub begin: u32,
    pub end: u32,
}

impl RecordInterval {
    pub fn overlaps(&self, begin: u32, end: u32) -> bool {
        self.end > begin && self.begin < end
    }
}

impl Display for RecordInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tid {
            Some(tid) => write!(f, "tid: {}, start: {}, end: {}", tid, self.begin, self.end),
            None => write!(f, "tid: -, start: {}, end: {}", self.begin, self.end),
        }
    }
}
