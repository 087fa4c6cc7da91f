use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use spin::Mutex;

use crate::{BlockDevice, SECTOR_SIZE};

/// 内存中的块设备，主要用于测试
pub struct RamDisk {
    sectors: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(sectors: usize) -> Self {
        Self {
            sectors: Mutex::new(vec![0; sectors * SECTOR_SIZE]),
        }
    }
}

impl fmt::Debug for RamDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamDisk")
            .field("sectors", &(self.sectors.lock().len() / SECTOR_SIZE))
            .finish()
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), SECTOR_SIZE, "not a complete block!");
        let sectors = self.sectors.lock();
        let start = block_id * SECTOR_SIZE;

        match sectors.get(start..start + SECTOR_SIZE) {
            Some(src) => buf.copy_from_slice(src),
            None => buf.fill(0),
        }
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), SECTOR_SIZE, "not a complete block!");
        let mut sectors = self.sectors.lock();
        let start = block_id * SECTOR_SIZE;

        assert!(
            start + SECTOR_SIZE <= sectors.len(),
            "sector {block_id} is out of the disk"
        );
        sectors[start..start + SECTOR_SIZE].copy_from_slice(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back_written_sector() {
        let disk = RamDisk::new(4);
        let data = [0xabu8; SECTOR_SIZE];
        disk.write_block(2, &data);

        let mut buf = [0u8; SECTOR_SIZE];
        disk.read_block(2, &mut buf);
        assert_eq!(buf, data);

        disk.read_block(1, &mut buf);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn reading_past_the_end_yields_zeroes() {
        let disk = RamDisk::new(1);
        let mut buf = [0xffu8; SECTOR_SIZE];
        disk.read_block(7, &mut buf);
        assert!(buf.iter().all(|&b| b == 0));
    }
}
