use crate::core::models::grid::DensityGrid;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Defines the interface for reading and writing density-map file formats.
///
/// Implementors handle the binary layout; the path helpers take care of opening
/// and buffering files.
pub trait MapFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a cubic density grid from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated, the header is malformed, or the
    /// map is not a cubic, equally spaced grid.
    fn read_from(reader: &mut impl Read) -> Result<DensityGrid, Self::Error>;

    /// Writes a density grid to a writer.
    fn write_to(grid: &DensityGrid, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a density grid from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<DensityGrid, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a density grid to a file path, creating or truncating the file.
    fn write_to_path<P: AsRef<Path>>(grid: &DensityGrid, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(grid, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
