use crate::core::io::traits::MapFile;
use crate::core::models::grid::{DensityGrid, GridError, cell_count, validate_geometry};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

const HEADER_LEN: usize = 1024;
const MODE_FLOAT32: i32 = 2;
const MAP_STAMP: &[u8; 4] = b"MAP ";
const LITTLE_ENDIAN_STAMP: [u8; 4] = [0x44, 0x44, 0x00, 0x00];
const BIG_ENDIAN_STAMP_BYTE: u8 = 0x11;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported MRC data mode {0} (only mode 2, 32-bit float, is supported)")]
    UnsupportedMode(i32),
    #[error("Big-endian MRC files are not supported")]
    UnsupportedByteOrder,
    #[error("Map is not cubic: {nx} x {ny} x {nz}")]
    NotCubic { nx: i32, ny: i32, nz: i32 },
    #[error("Invalid extended header length {0}")]
    InvalidExtendedHeader(i32),
    #[error("Map data is truncated: expected {expected} voxels")]
    Truncated { expected: usize },
    #[error("Invalid map geometry: {0}")]
    Geometry(#[from] GridError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MrcHeader {
    nx: i32,
    ny: i32,
    nz: i32,
    mode: i32,
    cell_a: f32,
    nsymbt: i32,
    machine_stamp: [u8; 4],
}

impl MrcHeader {
    fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, MapError> {
        let mut cursor = Cursor::new(&bytes[..]);
        let nx = cursor.read_i32::<LittleEndian>()?;
        let ny = cursor.read_i32::<LittleEndian>()?;
        let nz = cursor.read_i32::<LittleEndian>()?;
        let mode = cursor.read_i32::<LittleEndian>()?;

        cursor.set_position(40);
        let cell_a = cursor.read_f32::<LittleEndian>()?;

        cursor.set_position(92);
        let nsymbt = cursor.read_i32::<LittleEndian>()?;

        let mut machine_stamp = [0u8; 4];
        machine_stamp.copy_from_slice(&bytes[212..216]);

        Ok(Self {
            nx,
            ny,
            nz,
            mode,
            cell_a,
            nsymbt,
            machine_stamp,
        })
    }
}

/// Summary statistics written into the MRC header.
fn density_stats(data: &[f64]) -> (f32, f32, f32, f32) {
    if data.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let n = data.len() as f64;
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let mean = data.iter().sum::<f64>() / n;
    let rms = (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    (min as f32, max as f32, mean as f32, rms as f32)
}

/// MRC/CCP4 density maps: 1024-byte header, optional extended header, then
/// column-major voxel data (x varies fastest).
pub struct MrcFile;

impl MapFile for MrcFile {
    type Error = MapError;

    fn read_from(reader: &mut impl Read) -> Result<DensityGrid, Self::Error> {
        let mut header_bytes = [0u8; HEADER_LEN];
        reader.read_exact(&mut header_bytes)?;
        let header = MrcHeader::parse(&header_bytes)?;

        if header.machine_stamp[0] == BIG_ENDIAN_STAMP_BYTE {
            return Err(MapError::UnsupportedByteOrder);
        }
        if header.mode != MODE_FLOAT32 {
            return Err(MapError::UnsupportedMode(header.mode));
        }
        if header.nx != header.ny || header.ny != header.nz || header.nx < 0 {
            return Err(MapError::NotCubic {
                nx: header.nx,
                ny: header.ny,
                nz: header.nz,
            });
        }
        if header.nsymbt < 0 {
            return Err(MapError::InvalidExtendedHeader(header.nsymbt));
        }
        io::copy(
            &mut reader.by_ref().take(header.nsymbt as u64),
            &mut io::sink(),
        )?;

        let n = header.nx as usize;
        let side = header.cell_a as f64;
        validate_geometry(n, side)?;
        let total = cell_count(n)?;

        // Buffer only what the stream holds, so an inflated header ends as `Truncated`.
        let expected_bytes = (total as u64).saturating_mul(4);
        let mut bytes = Vec::new();
        reader.by_ref().take(expected_bytes).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < expected_bytes {
            return Err(MapError::Truncated { expected: total });
        }
        let mut raw = vec![0f32; total];
        LittleEndian::read_f32_into(&bytes, &mut raw);

        let mut data = vec![0.0; total];
        let mut values = raw.iter();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    if let Some(&value) = values.next() {
                        data[(x * n + y) * n + z] = value as f64;
                    }
                }
            }
        }
        Ok(DensityGrid::new(n, side, data)?)
    }

    fn write_to(grid: &DensityGrid, writer: &mut impl Write) -> Result<(), Self::Error> {
        let n = grid.n();
        let n_i32 = n as i32;
        let side = grid.side() as f32;
        let (dmin, dmax, dmean, rms) = density_stats(grid.data());

        let mut header = Vec::with_capacity(HEADER_LEN);
        for _ in 0..3 {
            header.write_i32::<LittleEndian>(n_i32)?;
        }
        header.write_i32::<LittleEndian>(MODE_FLOAT32)?;
        for _ in 0..3 {
            header.write_i32::<LittleEndian>(-n_i32 / 2)?;
        }
        for _ in 0..3 {
            header.write_i32::<LittleEndian>(n_i32)?;
        }
        for _ in 0..3 {
            header.write_f32::<LittleEndian>(side)?;
        }
        for _ in 0..3 {
            header.write_f32::<LittleEndian>(90.0)?;
        }
        for axis in 1..=3 {
            header.write_i32::<LittleEndian>(axis)?;
        }
        header.write_f32::<LittleEndian>(dmin)?;
        header.write_f32::<LittleEndian>(dmax)?;
        header.write_f32::<LittleEndian>(dmean)?;
        header.write_i32::<LittleEndian>(1)?; // ispg
        header.write_i32::<LittleEndian>(0)?; // nsymbt
        header.resize(196, 0);
        for _ in 0..3 {
            header.write_f32::<LittleEndian>(0.0)?;
        }
        header.extend_from_slice(MAP_STAMP);
        header.extend_from_slice(&LITTLE_ENDIAN_STAMP);
        header.write_f32::<LittleEndian>(rms)?;
        header.write_i32::<LittleEndian>(0)?; // nlabl
        header.resize(HEADER_LEN, 0);
        writer.write_all(&header)?;

        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    writer.write_f32::<LittleEndian>(grid.get(x, y, z) as f32)?;
                }
            }
        }
        Ok(())
    }
}
