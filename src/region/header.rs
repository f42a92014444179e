//! Region file location table.
//!
//! Each of the 1024 entries is a big-endian word: the upper 24 bits are the
//! sector offset of the chunk, the low 8 bits its length in sectors. A zero
//! word marks an absent chunk.

use std::ops::Range;

use super::{sector_to_offset, CHUNKS_PER_REGION, LOCATION_TABLE_SIZE};
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

const OFFSET_SHIFT: u32 = 8;
const SECTOR_COUNT_MASK: u32 = 0xFF;

/// Where one chunk lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub sector_offset: u32,
    pub sector_count: u32,
}

impl Location {
    pub fn from_word(word: u32) -> Option<Self> {
        if word == 0 {
            return None;
        }
        Some(Self {
            sector_offset: word >> OFFSET_SHIFT,
            sector_count: word & SECTOR_COUNT_MASK,
        })
    }

    /// Byte range covered by this location.
    pub fn byte_range(&self) -> Range<usize> {
        let start = sector_to_offset(self.sector_offset);
        start..start + sector_to_offset(self.sector_count)
    }

    /// Slice this chunk's sectors out of the whole file.
    pub fn slice<'a>(&self, file: &'a [u8]) -> Result<&'a [u8]> {
        let range = self.byte_range();
        if range.end > file.len() {
            return Err(Error::OutOfRange {
                position: range.start,
                requested: range.len(),
                length: file.len(),
            });
        }
        Ok(&file[range])
    }
}

/// Parsed location table: one optional [`Location`] per chunk slot.
#[derive(Debug, Clone)]
pub struct LocationTable {
    entries: Vec<Option<Location>>,
}

impl LocationTable {
    /// Parse the table from the start of a region file.
    pub fn parse(file: &[u8]) -> Result<Self> {
        if file.len() < LOCATION_TABLE_SIZE {
            return Err(Error::Corrupt(format!(
                "region file is {} bytes, shorter than its {} byte location table",
                file.len(),
                LOCATION_TABLE_SIZE
            )));
        }

        let mut cursor = ByteCursor::new(file[..LOCATION_TABLE_SIZE].to_vec());
        let words = cursor.read_array::<u32>(CHUNKS_PER_REGION)?;
        Ok(Self {
            entries: words.into_iter().map(Location::from_word).collect(),
        })
    }

    /// Occupied slots in index order.
    pub fn present(&self) -> impl Iterator<Item = (usize, Location)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.map(|location| (index, location)))
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(entries: &[(usize, u32, u8)]) -> Vec<u8> {
        let mut header = vec![0u8; LOCATION_TABLE_SIZE];
        for &(index, sector, count) in entries {
            let offset = index * 4;
            header[offset] = ((sector >> 16) & 0xFF) as u8;
            header[offset + 1] = ((sector >> 8) & 0xFF) as u8;
            header[offset + 2] = (sector & 0xFF) as u8;
            header[offset + 3] = count;
        }
        header
    }

    #[test]
    fn test_location_from_word() {
        assert_eq!(Location::from_word(0), None);
        let location = Location::from_word(0x0000_0201).unwrap();
        assert_eq!(location.sector_offset, 2);
        assert_eq!(location.sector_count, 1);
        assert_eq!(location.byte_range(), 8192..12288);
    }

    #[test]
    fn test_parse_table() {
        let header = table_with(&[(0, 2, 1), (33, 0x01_0203, 4), (1023, 7, 255)]);
        let table = LocationTable::parse(&header).unwrap();

        assert_eq!(table.present_count(), 3);
        let present: Vec<(usize, Location)> = table.present().collect();
        assert_eq!(
            present,
            vec![
                (0, Location { sector_offset: 2, sector_count: 1 }),
                (33, Location { sector_offset: 0x01_0203, sector_count: 4 }),
                (1023, Location { sector_offset: 7, sector_count: 255 }),
            ]
        );
    }

    #[test]
    fn test_short_file_is_corrupt() {
        assert!(matches!(
            LocationTable::parse(&[0u8; 100]),
            Err(Error::Corrupt(_))
        ));
    }

    #[test]
    fn test_slice_bounds() {
        let file = vec![0u8; 3 * 4096];
        let inside = Location { sector_offset: 2, sector_count: 1 };
        assert_eq!(inside.slice(&file).unwrap().len(), 4096);

        let outside = Location { sector_offset: 2, sector_count: 2 };
        assert!(matches!(outside.slice(&file), Err(Error::OutOfRange { .. })));
    }
}
