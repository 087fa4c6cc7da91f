mod cli;

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use clap::Parser;
use cli::Cli;
use simple_fs::{BLOCK_SIZE, BlockDevice, FsConfig, RamDisk, SECTORS_PER_BLOCK, SimpleFileSystem};
use simple_fs_shell::{BlockFile, Shell};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = FsConfig {
        total_blocks: cli.blocks,
        reject_duplicates: !cli.allow_duplicates,
    };

    let device: Arc<dyn BlockDevice> = if cli.memory {
        log::info!("using a RAM disk of {} blocks", cli.blocks);
        Arc::new(RamDisk::new(cli.blocks as usize * SECTORS_PER_BLOCK))
    } else {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&cli.image)?;
        let len = cli.blocks as u64 * BLOCK_SIZE as u64;
        if file.metadata()?.len() < len {
            file.set_len(len)?;
        }
        log::info!("using image {:?}", cli.image);
        Arc::new(BlockFile(Mutex::new(file)))
    };

    let efs = SimpleFileSystem::mount(device, config).map_err(io::Error::other)?;
    Shell::new(efs, io::stdout()).run(io::stdin().lock())
}
