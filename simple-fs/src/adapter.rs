//! # 块适配层
//!
//! 块设备以 [`SECTOR_SIZE`] 字节的扇区为单位读写，
//! 文件系统以 [`BLOCK_SIZE`] 字节的逻辑块为单位读写；
//! 逻辑块 `n` 由连续的物理扇区 `n*k .. n*k+k` 组成（`k` 为 [`SECTORS_PER_BLOCK`]）。
//!
//! 不做任何缓存，每次调用都会访问设备。

use block_dev::{BlockDevice, SECTOR_SIZE};

use crate::{BLOCK_SIZE, DataBlock, SECTORS_PER_BLOCK};

pub fn read(device: &dyn BlockDevice, block_id: u32, block: &mut DataBlock) {
    let first_sector = block_id as usize * SECTORS_PER_BLOCK;
    for (i, sector) in block.chunks_exact_mut(SECTOR_SIZE).enumerate() {
        device.read_block(first_sector + i, sector);
    }
}

pub fn write(device: &dyn BlockDevice, block_id: u32, block: &DataBlock) {
    let first_sector = block_id as usize * SECTORS_PER_BLOCK;
    for (i, sector) in block.chunks_exact(SECTOR_SIZE).enumerate() {
        device.write_block(first_sector + i, sector);
    }
}

#[inline]
pub fn zero(device: &dyn BlockDevice, block_id: u32) {
    write(device, block_id, &[0; BLOCK_SIZE]);
}
