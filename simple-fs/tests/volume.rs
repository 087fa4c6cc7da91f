mod common;

use common::*;
use simple_fs::{
    BLOCK_SIZE, BlockDevice, Error, FsConfig, InodeKind, OpenFlag, ROOT_INODE, SECTORS_PER_BLOCK,
    SimpleFileSystem,
};

const BLOCKS: u32 = 256;

fn zero_block(disk: &dyn BlockDevice, block_id: u32) {
    let first = block_id as usize * SECTORS_PER_BLOCK;
    for sector in first..first + SECTORS_PER_BLOCK {
        disk.write_block(sector, &[0; 512]);
    }
}

#[test]
fn blank_disk_is_formatted_on_mount() {
    let (_disk, efs) = fresh(BLOCKS);

    let usage = efs.statfs();
    assert_eq!(usage.inodes, 1);
    assert_eq!(usage.data_blocks, 1);
    assert_eq!(usage.inode_capacity, 1024);
    assert_eq!(usage.data_capacity, BLOCKS as usize - 13);
    assert_eq!(efs.cwd(), ROOT_INODE);
    assert_consistent(&efs);
}

#[test]
fn root_is_seeded_with_dot_entries() {
    let (_disk, efs) = fresh(BLOCKS);

    assert_eq!(efs.lookup("."), Ok(ROOT_INODE));
    assert_eq!(efs.lookup(".."), Ok(ROOT_INODE));
    assert_eq!(efs.lookup("/"), Ok(ROOT_INODE));
    assert_eq!(efs.lookup("/../.."), Ok(ROOT_INODE));

    let list = efs.list().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|info| info.kind == InodeKind::Directory));
    assert_eq!(names(&efs, "/"), [".", ".."]);
}

#[test]
fn contents_survive_a_remount() {
    let (disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("docs").unwrap();
    let fd = efs.open("/docs/readme", OpenFlag::write_only()).unwrap();
    efs.write(fd, b"hello, disk").unwrap();
    efs.close(fd).unwrap();
    let usage = efs.statfs();
    drop(efs);

    let mut efs = SimpleFileSystem::mount(disk, config(BLOCKS)).unwrap();
    assert_eq!(efs.statfs(), usage);
    assert_eq!(efs.cwd(), ROOT_INODE);
    assert_consistent(&efs);

    let fd = efs.open("docs/readme", OpenFlag::read_only()).unwrap();
    let mut buf = [0; 32];
    let n = efs.read(fd, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello, disk");
}

#[test]
fn primary_super_block_is_restored_from_backup() {
    let (disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("kept").unwrap();
    drop(efs);

    zero_block(&*disk, 1);

    let efs = SimpleFileSystem::mount(disk, config(BLOCKS)).unwrap();
    assert!(efs.lookup("/kept").is_ok());
    assert_consistent(&efs);
}

#[test]
fn stale_backup_is_rewritten_on_mount() {
    let (disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("kept").unwrap();
    drop(efs);

    zero_block(&*disk, BLOCKS - 1);

    let efs = SimpleFileSystem::mount(disk, config(BLOCKS)).unwrap();
    assert!(efs.lookup("/kept").is_ok());
    assert_consistent(&efs);
}

#[test]
fn mount_keeps_the_geometry_found_on_disk() {
    let (disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("kept").unwrap();
    drop(efs);

    let efs = SimpleFileSystem::mount(disk, config(BLOCKS / 2)).unwrap();
    assert!(efs.lookup("/kept").is_ok());
    assert_eq!(efs.statfs().data_capacity, BLOCKS as usize - 13);
    assert_consistent(&efs);
}

#[test]
fn volume_without_any_super_block_is_reformatted() {
    let (disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("lost").unwrap();
    drop(efs);

    zero_block(&*disk, 1);
    zero_block(&*disk, BLOCKS - 1);

    let efs = SimpleFileSystem::mount(disk, config(BLOCKS)).unwrap();
    assert_eq!(efs.lookup("/lost"), Err(Error::NotFound));
    assert_eq!(efs.statfs().inodes, 1);
    assert_consistent(&efs);
}

#[test]
fn format_resets_the_engine() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("a").unwrap();
    efs.chdir("a").unwrap();
    let fd = efs.open("f", OpenFlag::read_write()).unwrap();

    efs.format().unwrap();

    assert_eq!(efs.cwd(), ROOT_INODE);
    assert_eq!(efs.descriptor(fd), Err(Error::BadDescriptor));
    assert_eq!(efs.lookup("/a"), Err(Error::NotFound));
    assert_eq!(efs.statfs().inodes, 1);
    assert_eq!(efs.statfs().data_blocks, 1);
    assert_consistent(&efs);
}

#[test]
fn geometry_must_hold_the_metadata() {
    let disk = disk(64);
    let too_small = FsConfig {
        total_blocks: FsConfig::MIN_BLOCKS - 1,
        ..Default::default()
    };
    assert_eq!(
        SimpleFileSystem::mount(disk.clone(), too_small).err(),
        Some(Error::InvalidGeometry)
    );

    let smallest = config(FsConfig::MIN_BLOCKS);
    let efs = SimpleFileSystem::create(disk, smallest).unwrap();
    assert_eq!(efs.statfs().data_capacity, 1);
    assert_consistent(&efs);
}

#[test]
fn engine_can_be_shared_behind_a_lock() {
    let (_disk, efs) = fresh(BLOCKS);
    let shared = efs.into_shared();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let mut efs = shared.lock();
                let path = format!("/t{i}");
                let fd = efs.open(&path, OpenFlag::write_only()).unwrap();
                efs.write(fd, &[b'a' + i as u8; BLOCK_SIZE + 1]).unwrap();
                efs.close(fd).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let efs = shared.lock();
    assert_eq!(efs.list().unwrap().len(), 6);
    assert_eq!(efs.statfs().data_blocks, 1 + 4 * 2);
    assert_consistent(&efs);
}
