//! 交互式命令解释器
//!
//! 每行按空白切分为命令与参数，参数个数不符时打印用法；
//! 文件系统报错只打印一行诊断信息，循环继续。

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use simple_fs::{
    BLOCK_SIZE, Error, InodeKind, MAX_FILE_SIZE, MAX_NAME_LEN, OpenFlag, SimpleFileSystem,
};

/// `(命令, 最少参数, 最多参数, 参数说明)`
#[rustfmt::skip]
const COMMANDS: &[(&str, usize, usize, &str)] = &[
    ("exit",   0, 0, ""),
    ("mkfs",   0, 0, ""),
    ("open",   2, 2, " <path> <mode>"),
    ("read",   2, 2, " <fd> <count>"),
    ("write",  2, 2, " <fd> <text>"),
    ("lseek",  2, 2, " <fd> <offset>"),
    ("close",  1, 1, " <fd>"),
    ("mkdir",  1, 1, " <path>"),
    ("rmdir",  1, 1, " <path>"),
    ("cd",     1, 1, " <path>"),
    ("link",   2, 2, " <old> <new>"),
    ("unlink", 1, 1, " <path>"),
    ("stat",   1, 1, " <path>"),
    ("ls",     0, 1, " [path]"),
    ("create", 2, 2, " <path> <size>"),
    ("cat",    1, 1, " <path>"),
    ("fsck",   0, 0, ""),
];

/// `create` 每隔多少个字母换一行
const LINE_WIDTH: usize = 40;
/// `cat` 每次读取的字节数
const CAT_CHUNK: usize = 256;
/// `read` 一次最多读取的字节数
const MAX_READ: usize = BLOCK_SIZE;

/// 执行完一条命令后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<W> {
    efs: SimpleFileSystem,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(efs: SimpleFileSystem, out: W) -> Self {
        Self { efs, out }
    }

    #[inline]
    pub fn efs(&self) -> &SimpleFileSystem {
        &self.efs
    }

    /// 取走目前为止的输出
    pub fn take_output(&mut self) -> W
    where
        W: Default,
    {
        std::mem::take(&mut self.out)
    }

    /// 逐行读取命令并执行，直到 `exit` 或输入结束
    pub fn run(&mut self, mut input: impl BufRead) -> io::Result<()> {
        writeln!(self.out, "simple-fs shell {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out)?;

        let mut line = String::new();
        loop {
            write!(self.out, "# ")?;
            self.out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(());
            }
            if self.execute(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// 执行一行命令
    pub fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let argv: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = argv.split_first() else {
            return Ok(Flow::Continue);
        };

        let Some(&(_, min, max, hint)) = COMMANDS.iter().find(|(name, ..)| *name == cmd) else {
            writeln!(self.out, "{cmd} : Command not found.")?;
            return Ok(Flow::Continue);
        };
        if !(min..=max).contains(&args.len()) {
            writeln!(self.out, "Usage : {cmd}{hint}")?;
            return Ok(Flow::Continue);
        }

        log::debug!("command {argv:?}");
        match (cmd, args) {
            ("exit", _) => {
                writeln!(self.out, "Goodbye")?;
                return Ok(Flow::Exit);
            }
            ("mkfs", _) => {
                if let Err(err) = self.efs.format() {
                    writeln!(self.out, "mkfs failed: {err}")?;
                }
            }
            ("open", &[path, mode]) => {
                let opened = number(mode)
                    .and_then(OpenFlag::parse)
                    .and_then(|flags| self.efs.open(path, flags));
                match opened {
                    Ok(fd) => writeln!(self.out, "File handle is : {fd}")?,
                    Err(err) => writeln!(self.out, "Error while opening file: {err}")?,
                }
            }
            ("read", &[fd, count]) => self.read(fd, count)?,
            ("write", &[fd, text]) => {
                match number(fd).and_then(|fd| self.efs.write(fd, text.as_bytes())) {
                    Ok(_) => writeln!(self.out, "Done")?,
                    Err(err) => writeln!(self.out, "Error while writing file: {err}")?,
                }
            }
            ("lseek", &[fd, offset]) => {
                let sought = number(fd).and_then(|fd| self.efs.seek(fd, number(offset)?));
                self.report(sought, "Problem with seeking")?;
            }
            ("close", &[fd]) => {
                let closed = number(fd).and_then(|fd| self.efs.close(fd));
                self.report(closed, "Problem with closing file")?;
            }
            ("mkdir", &[path]) => {
                let made = self.efs.mkdir(path);
                self.report(made, "Problem with making directory")?;
            }
            ("rmdir", &[path]) => {
                let removed = self.efs.rmdir(path);
                self.report(removed, "Problem with removing directory")?;
            }
            ("cd", &[path]) => {
                let changed = self.efs.chdir(path);
                self.report(changed, "Problem with changing directory")?;
            }
            ("link", &[old, new]) => {
                if let Err(err) = self.efs.link(old, new) {
                    writeln!(self.out, "Problem with link: {err}")?;
                }
            }
            ("unlink", &[path]) => {
                if let Err(err) = self.efs.unlink(path) {
                    writeln!(self.out, "Problem with unlink: {err}")?;
                }
            }
            ("stat", &[path]) => {
                if let Err(err) = self.efs.stat(path) {
                    writeln!(self.out, "Stat failed: {err}")?;
                }
            }
            ("ls", args) => self.ls(args.first().copied())?,
            ("create", &[path, size]) => {
                if let Err(err) = number(size).and_then(|size| self.create(path, size)) {
                    writeln!(self.out, "Error creating file: {err}")?;
                }
            }
            ("cat", &[path]) => self.cat(path)?,
            ("fsck", _) => self.fsck()?,
            _ => unreachable!("arity is checked against the command table"),
        }

        Ok(Flow::Continue)
    }

    fn report(&mut self, result: simple_fs::Result<()>, failure: &str) -> io::Result<()> {
        match result {
            Ok(()) => writeln!(self.out, "OK"),
            Err(err) => writeln!(self.out, "{failure}: {err}"),
        }
    }

    fn read(&mut self, fd: &str, count: &str) -> io::Result<()> {
        let count: usize = match number(count) {
            Ok(count) => count,
            Err(err) => return writeln!(self.out, "Read failed: {err}"),
        };
        if count > MAX_READ {
            return writeln!(self.out, "Requested size too big");
        }

        let read = number(fd).and_then(|fd| {
            let mut data = vec![0; count];
            let n = self.efs.read(fd, &mut data)?;
            data.truncate(n);
            Ok(data)
        });

        match read {
            Ok(data) => writeln!(self.out, "Data read in : {}", String::from_utf8_lossy(&data)),
            Err(err) => writeln!(self.out, "Read failed: {err}"),
        }
    }

    /// 名字一栏宽 `MAX_NAME_LEN + 1`，其后依次是类型、索引节点编号与大小
    fn ls(&mut self, path: Option<&str>) -> io::Result<()> {
        let listed = match path {
            Some(path) => self.efs.list_at(path),
            None => self.efs.list(),
        };
        let entries = match listed {
            Ok(entries) => entries,
            Err(err) => return writeln!(self.out, "Problem with ls: {err}"),
        };

        let width = MAX_NAME_LEN + 1;
        writeln!(self.out, "{:width$}Type Inode Size", "Name")?;
        for entry in entries {
            let kind = match entry.kind {
                InodeKind::Directory => 'D',
                _ => 'F',
            };
            writeln!(
                self.out,
                "{:width$}{kind}    {:<5} {}",
                entry.name, entry.inode, entry.size
            )?;
        }
        Ok(())
    }

    /// 写入 `size` 个循环的字母，每 [`LINE_WIDTH`] 个字母后插入换行
    fn create(&mut self, path: &str, size: usize) -> simple_fs::Result<()> {
        if size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let mut text = Vec::with_capacity(size + size / LINE_WIDTH);
        for i in 0..size {
            text.push(b'A' + (i % 37) as u8);
            if (i + 1) % LINE_WIDTH == 0 {
                text.push(b'\n');
            }
        }

        let fd = self.efs.open(path, OpenFlag::read_write())?;
        let written = self.efs.write(fd, &text);
        self.efs.close(fd)?;
        written.map(|_| ())
    }

    fn cat(&mut self, path: &str) -> io::Result<()> {
        let fd = match self.efs.open(path, OpenFlag::read_only()) {
            Ok(fd) => fd,
            Err(err) => return writeln!(self.out, "Cat failed: {err}"),
        };

        let mut buf = [0; CAT_CHUNK];
        loop {
            match self.efs.read(fd, &mut buf) {
                Ok(0) => break,
                Ok(n) => self.out.write_all(&buf[..n])?,
                Err(err) => {
                    writeln!(self.out, "Cat failed: {err}")?;
                    break;
                }
            }
        }
        writeln!(self.out)?;
        if let Err(err) = self.efs.close(fd) {
            writeln!(self.out, "Problem with closing file: {err}")?;
        }
        Ok(())
    }

    fn fsck(&mut self) -> io::Result<()> {
        let usage = self.efs.statfs();
        writeln!(
            self.out,
            "inodes {}/{}, data blocks {}/{}",
            usage.inodes, usage.inode_capacity, usage.data_blocks, usage.data_capacity
        )?;
        let checked = self.efs.fsck();
        self.report(checked, "fsck failed")
    }
}

/// 命令参数中的数字
fn number<T: FromStr>(arg: &str) -> simple_fs::Result<T> {
    arg.parse().map_err(|_| Error::InvalidArgument)
}
