use crate::core::models::profile::{Profile, ProfileError};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum DatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No numeric data rows found")]
    NoData,
    #[error("Line {line}: expected at least 2 numeric columns, found {count}")]
    TooFewColumns { line: usize, count: usize },
    #[error("Invalid profile: {0}")]
    Profile(#[from] ProfileError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown angular units '{0}'. Expected 'a' (1/angstrom) or 'nm' (1/nanometer).")]
pub struct UnknownUnits(pub String);

/// Units of the frequency column of a profile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    InverseAngstrom,
    InverseNanometer,
}

impl Units {
    /// Factor that converts a frequency in these units to inverse angstroms.
    pub fn to_inverse_angstrom(self) -> f64 {
        match self {
            Units::InverseAngstrom => 1.0,
            Units::InverseNanometer => 0.1,
        }
    }
}

impl FromStr for Units {
    type Err = UnknownUnits;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "angstrom" => Ok(Units::InverseAngstrom),
            "nm" | "nanometer" => Ok(Units::InverseNanometer),
            _ => Err(UnknownUnits(s.to_string())),
        }
    }
}

/// A profile as read from disk, together with the optional fitted curve and maximum
/// particle dimension found in `.fit`-style files.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub profile: Profile,
    pub fit: Option<Vec<f64>>,
    pub dmax: Option<f64>,
}

impl LoadedProfile {
    pub fn is_fit(&self) -> bool {
        self.fit.is_some()
    }
}

fn parse_row(line: &str) -> Option<Vec<f64>> {
    line.split_whitespace()
        .map(|token| token.parse::<f64>().ok())
        .collect()
}

/// Looks for `dmax = 123.4` / `Dmax: 123.4` inside a comment line.
fn parse_dmax(line: &str) -> Option<f64> {
    let lower = line.to_ascii_lowercase();
    let start = lower.find("dmax")? + "dmax".len();
    let rest = lower[start..].trim_start().strip_prefix(['=', ':'])?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Number rendering for written profile columns, in the style of C's `%e` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub precision: usize,
    /// Prefix non-negative values with a space (the `% e` flag) so columns line up.
    pub sign_pad: bool,
}

impl ColumnFormat {
    /// `% .{precision}e`
    pub const fn padded(precision: usize) -> Self {
        Self {
            precision,
            sign_pad: true,
        }
    }

    /// `%.{precision}e`
    pub const fn plain(precision: usize) -> Self {
        Self {
            precision,
            sign_pad: false,
        }
    }

    /// Mantissa with `precision` digits and a signed, two-digit-minimum exponent.
    pub fn render(&self, value: f64) -> String {
        if !value.is_finite() {
            let text = if value.is_nan() {
                "nan"
            } else if value > 0.0 {
                "inf"
            } else {
                "-inf"
            };
            return if self.sign_pad {
                format!("{:>width$}", text, width = self.precision + 7)
            } else {
                text.to_string()
            };
        }
        let raw = format!("{:.*e}", self.precision, value);
        let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        let pad = if self.sign_pad && !value.is_sign_negative() {
            " "
        } else {
            ""
        };
        format!("{pad}{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// Whitespace-delimited profile files: `q I [sigma [fit]]` per row.
pub struct DatFile;

impl DatFile {
    /// Parses a profile, skipping blank, comment and non-numeric lines as well as rows
    /// whose column count differs from the first data row. Frequencies are converted to
    /// inverse angstroms.
    pub fn read_from(reader: &mut impl BufRead, units: Units) -> Result<LoadedProfile, DatError> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut width: Option<usize> = None;
        let mut dmax = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                if dmax.is_none() {
                    dmax = parse_dmax(trimmed);
                }
                continue;
            }
            let Some(values) = parse_row(trimmed) else {
                trace!(line = line_num, "Skipping non-numeric line.");
                continue;
            };
            match width {
                None => {
                    if values.len() < 2 {
                        return Err(DatError::TooFewColumns {
                            line: line_num,
                            count: values.len(),
                        });
                    }
                    width = Some(values.len());
                    rows.push(values);
                }
                Some(w) if values.len() == w => rows.push(values),
                Some(_) => trace!(line = line_num, "Skipping row with inconsistent column count."),
            }
        }

        let width = width.ok_or(DatError::NoData)?;
        let scale = units.to_inverse_angstrom();
        let column = |c: usize| rows.iter().map(|r| r[c]).collect::<Vec<f64>>();

        let q: Vec<f64> = rows.iter().map(|r| r[0] * scale).collect();
        let intensity = column(1);
        let sigma = (width >= 3).then(|| column(2));
        let fit = (width >= 4).then(|| column(3));

        debug!(rows = q.len(), columns = width, "Loaded profile data.");
        Ok(LoadedProfile {
            profile: Profile::new(q, intensity, sigma)?,
            fit,
            dmax,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, units: Units) -> Result<LoadedProfile, DatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, units)
    }

    /// Reads the first column of every line that starts with a number. Used to borrow the
    /// frequencies of another file as a resampling target; NaN entries are dropped.
    pub fn read_q_values(reader: &mut impl BufRead) -> Result<Vec<f64>, DatError> {
        let mut q = Vec::new();
        for line_res in reader.lines() {
            let line = line_res?;
            let Some(first) = line.split_whitespace().next() else {
                continue;
            };
            if let Ok(value) = first.parse::<f64>() {
                if !value.is_nan() {
                    q.push(value);
                }
            }
        }
        if q.is_empty() {
            return Err(DatError::NoData);
        }
        Ok(q)
    }

    pub fn load_q_values<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, DatError> {
        let file = File::open(path)?;
        Self::read_q_values(&mut BufReader::new(file))
    }

    /// Writes one row per sample; the uncertainty column is present only when the
    /// profile carries one.
    pub fn write_to(
        profile: &Profile,
        writer: &mut impl Write,
        format: ColumnFormat,
    ) -> Result<(), DatError> {
        for point in profile.points() {
            write!(
                writer,
                "{} {}",
                format.render(point.q),
                format.render(point.intensity)
            )?;
            if let Some(sigma) = point.sigma {
                write!(writer, " {}", format.render(sigma))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(
        profile: &Profile,
        path: P,
        format: ColumnFormat,
    ) -> Result<(), DatError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(profile, &mut writer, format)?;
        writer.flush()?;
        Ok(())
    }
}
