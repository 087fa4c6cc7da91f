use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 索引节点位图已满
    NoFreeInode,
    /// 数据块位图已满
    NoFreeBlock,
    /// 超出单个索引节点可索引的块数
    FileTooLarge,
    /// 文件描述符表已满
    TooManyOpenFiles,
    InvalidMode,
    NameTooLong,
    PathTooLong,
    EmptyPath,
    /// 描述符越界或未打开
    BadDescriptor,
    InvalidArgument,
    /// 卷的大小放不下元数据
    InvalidGeometry,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    DirectoryNotEmpty,
    /// 目录仍被占用：根目录、工作目录或仍有打开的描述符
    Busy,
    /// 描述符的打开模式不允许该操作
    PermissionDenied,
    /// 磁盘上的计数与位图不一致
    Corrupted,
    Unimplemented,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoFreeInode => "no free inode",
            Self::NoFreeBlock => "no free data block",
            Self::FileTooLarge => "file too large",
            Self::TooManyOpenFiles => "too many open files",
            Self::InvalidMode => "invalid open mode",
            Self::NameTooLong => "file name too long",
            Self::PathTooLong => "path too long",
            Self::EmptyPath => "empty path",
            Self::BadDescriptor => "bad file descriptor",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidGeometry => "invalid volume geometry",
            Self::NotFound => "no such file or directory",
            Self::NotADirectory => "not a directory",
            Self::IsADirectory => "is a directory",
            Self::AlreadyExists => "file exists",
            Self::DirectoryNotEmpty => "directory not empty",
            Self::Busy => "resource busy",
            Self::PermissionDenied => "permission denied",
            Self::Corrupted => "file system corrupted",
            Self::Unimplemented => "not implemented",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}
