use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Interactive shell over a simple-fs volume")]
pub struct Cli {
    /// Disk image file, created when missing
    #[arg(default_value = "disk.img")]
    pub image: PathBuf,

    /// Volume size in logical blocks
    #[arg(long, short, default_value_t = 2048)]
    pub blocks: u32,

    /// Allow several entries with the same name in one directory
    #[arg(long)]
    pub allow_duplicates: bool,

    /// Work on a RAM disk instead of the image file
    #[arg(long, short)]
    pub memory: bool,
}
