use std::io;

use reframe_bytes_util::BitReader;

use super::frame_header::TileInfo;

/// The tile range covered by a tile group OBU, AV1 - 5.11.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGroup {
    /// `tg_start`
    pub tg_start: u32,
    /// `tg_end`
    pub tg_end: u32,
    /// `NumTiles` of the frame the group belongs to.
    pub num_tiles: u32,
}

impl TileGroup {
    /// Parses the start of a tile group OBU payload.
    pub fn parse(reader: &mut impl io::Read, tile_info: &TileInfo) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);
        let num_tiles = tile_info.num_tiles();
        if num_tiles == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "tile group without a frame header"));
        }

        let tile_start_and_end_present = num_tiles > 1 && bit_reader.read_bit()?;
        let (tg_start, tg_end) = if tile_start_and_end_present {
            let tile_bits = (tile_info.tile_cols_log2 + tile_info.tile_rows_log2) as u8;
            (
                bit_reader.read_bits(tile_bits)? as u32,
                bit_reader.read_bits(tile_bits)? as u32,
            )
        } else {
            (0, num_tiles - 1)
        };

        if tg_end < tg_start || tg_end >= num_tiles {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid tile group range"));
        }

        Ok(Self {
            tg_start,
            tg_end,
            num_tiles,
        })
    }

    /// True if this group holds the last tile of the frame.
    pub const fn is_last(&self) -> bool {
        self.tg_end == self.num_tiles - 1
    }
}
