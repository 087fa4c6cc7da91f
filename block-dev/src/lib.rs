//! # 块设备接口层
//!
//! 块设备是以**扇区**为单位存储数据的设备，例如磁盘、U盘、镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 读写失败没有恢复路径，驱动直接 panic。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod ram_disk;

use core::any::Any;
use core::fmt::Debug;

pub use self::ram_disk::RamDisk;

/// 物理扇区大小
pub const SECTOR_SIZE: usize = 512;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any + Debug {
    /// 读出一个扇区；越过介质末尾的部分读作全零。
    /// `buf.len()` 必须等于 [`SECTOR_SIZE`]。
    fn read_block(&self, block_id: usize, buf: &mut [u8]);

    /// 写入一个扇区。
    /// `buf.len()` 必须等于 [`SECTOR_SIZE`]。
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
