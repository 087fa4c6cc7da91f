#![allow(dead_code)]

use std::sync::Arc;

use simple_fs::{FsConfig, RamDisk, SECTORS_PER_BLOCK, SimpleFileSystem};

pub fn disk(total_blocks: u32) -> Arc<RamDisk> {
    Arc::new(RamDisk::new(total_blocks as usize * SECTORS_PER_BLOCK))
}

pub fn config(total_blocks: u32) -> FsConfig {
    FsConfig {
        total_blocks,
        ..Default::default()
    }
}

/// 在空白内存盘上挂载（即格式化）一个卷
pub fn fresh(total_blocks: u32) -> (Arc<RamDisk>, SimpleFileSystem) {
    let disk = disk(total_blocks);
    let efs = SimpleFileSystem::mount(disk.clone(), config(total_blocks)).unwrap();
    (disk, efs)
}

/// 每个修改操作之后，计数与位图、主备超级块都必须一致
#[track_caller]
pub fn assert_consistent(efs: &SimpleFileSystem) {
    assert_eq!(efs.fsck(), Ok(()));
}

pub fn names(efs: &SimpleFileSystem, path: &str) -> Vec<String> {
    efs.list_at(path)
        .unwrap()
        .into_iter()
        .map(|info| info.name)
        .collect()
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}
