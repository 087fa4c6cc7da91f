
mod shell;
pub use shell::{Flow, Shell};

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::io::{Seek, SeekFrom};
use std::sync::Mutex;

use block_dev::{BlockDevice, SECTOR_SIZE};

/// 以宿主机上的镜像文件充当块设备
#[derive(Debug)]
pub struct BlockFile(pub Mutex<File>);

impl BlockDevice for BlockFile {
    /// 超出文件末尾的部分读作 0
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), SECTOR_SIZE, "not a complete block!");
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * SECTOR_SIZE) as u64))
            .expect("seeking error");

        let mut filled = 0;
        while filled < SECTOR_SIZE {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => panic!("reading error: {err}"),
            }
        }
        buf[filled..].fill(0);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), SECTOR_SIZE, "not a complete block!");
        let mut file = self.0.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * SECTOR_SIZE) as u64))
            .expect("seeking error");
        file.write_all(buf).expect("writing error");
    }
}
