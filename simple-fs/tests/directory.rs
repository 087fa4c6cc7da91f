mod common;

use common::*;
use simple_fs::{
    Error, FsConfig, InodeKind, MAX_NAME_LEN, MAX_PATH_LEN, OpenFlag, ROOT_INODE, SimpleFileSystem,
};

const BLOCKS: u32 = 512;

#[test]
fn new_directory_is_seeded_with_dot_entries() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("a").unwrap();
    assert_consistent(&efs);

    let a = efs.lookup("a").unwrap();
    assert_ne!(a, ROOT_INODE);
    assert_eq!(efs.lookup("a/."), Ok(a));
    assert_eq!(efs.lookup("a/.."), Ok(ROOT_INODE));
    assert_eq!(names(&efs, "a"), [".", ".."]);
    assert_eq!(names(&efs, "/"), [".", "..", "a"]);

    efs.mkdir("a/b").unwrap();
    let b = efs.lookup("/a/b").unwrap();
    assert_eq!(efs.lookup("/a/b/.."), Ok(a));
    assert_eq!(efs.lookup("/a/b/../../a/b/."), Ok(b));
    assert_consistent(&efs);
}

#[test]
fn relative_and_absolute_paths_meet() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("a").unwrap();
    efs.chdir("a").unwrap();

    let a = efs.lookup("/a").unwrap();
    assert_eq!(efs.cwd(), a);
    assert_eq!(efs.lookup("../a"), efs.lookup("/a"));
    assert_eq!(efs.lookup("."), Ok(a));

    // 目录不能以可写方式打开
    assert_eq!(efs.open("../a", OpenFlag::write_only()), Err(Error::IsADirectory));
    assert_eq!(efs.open("/a", OpenFlag::write_only()), Err(Error::IsADirectory));
    let fd = efs.open("../a", OpenFlag::read_only()).unwrap();
    assert_eq!(efs.descriptor(fd).unwrap().inode_id(), a);

    // 相对路径从工作目录出发
    efs.mkdir("inner").unwrap();
    assert_eq!(names(&efs, "/a"), [".", "..", "inner"]);
    efs.chdir("/").unwrap();
    assert_eq!(efs.cwd(), ROOT_INODE);
    assert_eq!(efs.list().unwrap().len(), 3);
}

#[test]
fn chdir_needs_an_existing_directory() {
    let (_disk, mut efs) = fresh(BLOCKS);
    let fd = efs.open("plain", OpenFlag::write_only()).unwrap();
    efs.close(fd).unwrap();

    assert_eq!(efs.chdir("plain"), Err(Error::NotADirectory));
    assert_eq!(efs.chdir("missing"), Err(Error::NotFound));
    assert_eq!(efs.chdir("plain/x"), Err(Error::NotADirectory));
    assert_eq!(efs.cwd(), ROOT_INODE);
}

#[test]
fn duplicate_directory_names_are_rejected_by_default() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("x").unwrap();
    assert_eq!(efs.mkdir("x"), Err(Error::AlreadyExists));
    assert_eq!(names(&efs, "/"), [".", "..", "x"]);
    assert_eq!(efs.statfs().inodes, 2);
    assert_consistent(&efs);
}

/// 允许同名项时，两次创建都成功，目录中出现两个 `x`，查找总是命中先创建的那个
#[test]
fn duplicate_directory_names_pass_when_checking_is_off() {
    let disk = disk(BLOCKS);
    let config = FsConfig {
        total_blocks: BLOCKS,
        reject_duplicates: false,
    };
    let mut efs = SimpleFileSystem::mount(disk, config).unwrap();

    efs.mkdir("x").unwrap();
    let first = efs.lookup("x").unwrap();
    efs.mkdir("x").unwrap();

    let list = efs.list().unwrap();
    let xs: Vec<_> = list.iter().filter(|info| info.name == "x").collect();
    assert_eq!(xs.len(), 2);
    assert_ne!(xs[0].inode, xs[1].inode);
    assert_eq!(efs.lookup("x"), Ok(first));
    assert_consistent(&efs);
}

#[test]
fn mkdir_validates_names() {
    let (_disk, mut efs) = fresh(BLOCKS);

    assert_eq!(efs.mkdir("."), Err(Error::AlreadyExists));
    assert_eq!(efs.mkdir(".."), Err(Error::AlreadyExists));
    assert_eq!(efs.mkdir("/"), Err(Error::AlreadyExists));
    assert_eq!(efs.mkdir(""), Err(Error::EmptyPath));
    assert_eq!(efs.mkdir(&"n".repeat(MAX_NAME_LEN + 1)), Err(Error::NameTooLong));
    assert_eq!(efs.mkdir(&"n".repeat(MAX_PATH_LEN + 1)), Err(Error::PathTooLong));
    assert_eq!(efs.mkdir("missing/child"), Err(Error::NotFound));

    efs.mkdir(&"n".repeat(MAX_NAME_LEN)).unwrap();
    assert_eq!(efs.statfs().inodes, 2);
    assert_consistent(&efs);
}

#[test]
fn rmdir_releases_everything_mkdir_took() {
    let (_disk, mut efs) = fresh(BLOCKS);
    let before = efs.statfs();

    efs.mkdir("gone").unwrap();
    efs.rmdir("gone").unwrap();

    assert_eq!(efs.statfs(), before);
    assert_eq!(efs.lookup("gone"), Err(Error::NotFound));
    assert_eq!(names(&efs, "/"), [".", ".."]);
    assert_consistent(&efs);
}

#[test]
fn rmdir_moves_the_last_entry_into_the_hole() {
    let (_disk, mut efs) = fresh(BLOCKS);
    for name in ["a", "b", "c"] {
        efs.mkdir(name).unwrap();
    }
    let c = efs.lookup("c").unwrap();

    efs.rmdir("a").unwrap();
    assert_eq!(names(&efs, "/"), [".", "..", "c", "b"]);
    assert_eq!(efs.lookup("c"), Ok(c));
    assert_consistent(&efs);
}

#[test]
fn rmdir_refuses_what_is_in_use() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("full").unwrap();
    efs.mkdir("full/child").unwrap();
    efs.mkdir("here").unwrap();
    efs.mkdir("held").unwrap();
    let fd = efs.open("/file", OpenFlag::write_only()).unwrap();

    assert_eq!(efs.rmdir("/"), Err(Error::Busy));
    assert_eq!(efs.rmdir("full"), Err(Error::DirectoryNotEmpty));
    assert_eq!(efs.rmdir("file"), Err(Error::NotADirectory));
    assert_eq!(efs.rmdir("nothing"), Err(Error::NotFound));
    assert_eq!(efs.rmdir("full/."), Err(Error::InvalidArgument));
    assert_eq!(efs.rmdir("full/.."), Err(Error::InvalidArgument));

    efs.chdir("here").unwrap();
    assert_eq!(efs.rmdir("/here"), Err(Error::Busy));
    efs.chdir("/").unwrap();

    let held = efs.open("held", OpenFlag::read_only()).unwrap();
    assert_eq!(efs.rmdir("held"), Err(Error::Busy));
    efs.close(held).unwrap();

    efs.rmdir("full/child").unwrap();
    efs.rmdir("full").unwrap();
    efs.rmdir("here").unwrap();
    efs.rmdir("held").unwrap();
    efs.close(fd).unwrap();
    assert_eq!(names(&efs, "/"), [".", "..", "file"]);
    assert_consistent(&efs);
}

#[test]
fn directory_spills_into_the_indirect_block() {
    let (_disk, mut efs) = fresh(BLOCKS);
    efs.mkdir("big").unwrap();
    efs.chdir("big").unwrap();

    // 每块 64 项，12 块需要间接索引
    let count = 64 * 12 - 2;
    for i in 0..count {
        let fd = efs.open(&format!("f{i}"), OpenFlag::write_only()).unwrap();
        efs.close(fd).unwrap();
    }
    assert_consistent(&efs);

    let big = efs.list_at("/big").unwrap();
    assert_eq!(big.len(), count + 2);
    assert!(big[2..].iter().all(|info| info.kind == InodeKind::File));
    assert_eq!(big.last().map(|info| info.name.as_str()), Some("f765"));
    assert!(efs.lookup("/big/f765").is_ok());

    // 1 根目录块 + 12 目录块 + 1 间接索引块
    assert_eq!(efs.statfs().data_blocks, 14);
}

#[test]
fn shrinking_directory_returns_its_tail_blocks() {
    let (_disk, mut efs) = fresh(BLOCKS);
    // 根目录已有 `.` 与 `..`，再加 62 项正好占满一块
    for i in 0..63 {
        efs.mkdir(&format!("d{i}")).unwrap();
    }
    // 63 个子目录各 1 块，根目录 2 块
    assert_eq!(efs.statfs().data_blocks, 63 + 2);

    efs.rmdir("d62").unwrap();
    assert_eq!(efs.statfs().data_blocks, 62 + 1);
    assert_consistent(&efs);
}

#[test]
fn inode_exhaustion_leaves_no_trace() {
    let (_disk, mut efs) = fresh(2200);
    efs.mkdir("d").unwrap();
    efs.chdir("d").unwrap();
    let mut made = 0;
    loop {
        match efs.mkdir(&format!("{made}")) {
            Ok(()) => made += 1,
            Err(err) => {
                assert_eq!(err, Error::NoFreeInode);
                break;
            }
        }
    }
    assert_eq!(made, 1024 - 2);
    assert_eq!(efs.statfs().inodes, 1024);
    assert_consistent(&efs);

    assert_eq!(efs.open("/f", OpenFlag::write_only()), Err(Error::NoFreeInode));
    assert_eq!(efs.lookup("/f"), Err(Error::NotFound));
}

#[test]
fn failed_mkdir_rolls_back_its_inode() {
    // 数据区只有 3 块：根目录占 1 块
    let (_disk, mut efs) = fresh(16);
    efs.mkdir("one").unwrap();
    efs.mkdir("two").unwrap();
    let before = efs.statfs();
    assert_eq!(before.data_blocks, 3);

    assert_eq!(efs.mkdir("three"), Err(Error::NoFreeBlock));
    assert_eq!(efs.statfs(), before);
    assert_eq!(efs.lookup("three"), Err(Error::NotFound));
    assert_consistent(&efs);
}
