//! Directory reading and entry-kind resolution.
//!
//! [`DirReader`] wraps the raw opendir/readdir/closedir interface and
//! yields owned entries one at a time, each with the kernel's entry-kind
//! hint when the platform delivers one. `.` and `..` are never yielded;
//! `.snapshot` is filtered unless the caller asks for it. The handle is
//! closed on every exit path by `Drop`.
//!
//! A reader is not thread-safe and is `!Send` by construction; each
//! worker owns its reader for the duration of one directory.

use crate::walker::WalkStats;
use std::ffi::{CStr, CString, OsString};
use std::fs;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

/// Entry-kind hint as delivered by the directory stream.
///
/// `Unknown` is the normal case on filesystems that do not fill in
/// `d_type`; it must be promoted with a metadata call before the entry
/// can be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Dir,
    NonDir,
    Unknown,
}

/// One directory entry: the bare name and the kind hint.
#[derive(Debug)]
pub struct Entry {
    pub name: OsString,
    pub kind: Kind,
}

/// Streaming reader over one open directory.
pub struct DirReader {
    dirp: *mut libc::DIR,
    include_snapshot: bool,
}

impl DirReader {
    /// Open `path` for enumeration. `include_snapshot` controls whether
    /// `.snapshot` entries are yielded or silently skipped.
    pub fn open(path: &Path, include_snapshot: bool) -> io::Result<Self> {
        let cpath = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        let dirp = unsafe { libc::opendir(cpath.as_ptr()) };
        if dirp.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            dirp,
            include_snapshot,
        })
    }

    fn next_entry(&mut self) -> Option<io::Result<Entry>> {
        loop {
            // readdir signals end-of-stream and failure the same way;
            // a cleared errno is the only disambiguator.
            errno::set_errno(errno::Errno(0));
            let dirent = unsafe { libc::readdir(self.dirp) };
            if dirent.is_null() {
                let err = io::Error::last_os_error();
                return match err.raw_os_error() {
                    Some(0) => None,
                    _ => Some(Err(err)),
                };
            }

            let name = name_bytes(dirent);
            if name == b"." || name == b".." {
                continue;
            }
            if !self.include_snapshot && name == b".snapshot" {
                continue;
            }

            return Some(Ok(Entry {
                name: OsString::from_vec(name.to_vec()),
                kind: kind_hint(dirent),
            }));
        }
    }
}

impl Iterator for DirReader {
    type Item = io::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry()
    }
}

impl Drop for DirReader {
    fn drop(&mut self) {
        unsafe {
            libc::closedir(self.dirp);
        }
    }
}

// The dirent may live in a buffer shorter than `libc::dirent`, so its
// fields are read through offsets rather than a whole-struct reference.
// See https://github.com/rust-lang/rust/blob/1.80.1/library/std/src/sys/pal/unix/fs.rs#L725-L742
fn name_bytes<'a>(dirent: *const libc::dirent) -> &'a [u8] {
    const OFFSET: isize = std::mem::offset_of!(libc::dirent, d_name) as isize;
    unsafe { CStr::from_ptr(dirent.byte_offset(OFFSET).cast()) }.to_bytes()
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn kind_hint(dirent: *const libc::dirent) -> Kind {
    const OFFSET: isize = std::mem::offset_of!(libc::dirent, d_type) as isize;
    let d_type = unsafe { dirent.byte_offset(OFFSET).cast::<u8>().read_unaligned() };
    match d_type {
        libc::DT_DIR => Kind::Dir,
        libc::DT_UNKNOWN => Kind::Unknown,
        _ => Kind::NonDir,
    }
}

/// Platforms without `d_type` get no hint; every entry takes the
/// metadata-call branch.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn kind_hint(_dirent: *const libc::dirent) -> Kind {
    Kind::Unknown
}

/// Decide whether `path` is a directory.
///
/// A definite hint is trusted unless `force_stat` asks for a metadata
/// call anyway (the call itself is the point: it warms client caches).
/// The metadata call never follows symlinks. Failures propagate so the
/// caller can report and classify the entry as a non-directory.
pub fn resolve_is_dir(
    path: &Path,
    hint: Kind,
    force_stat: bool,
    stats: &WalkStats,
) -> io::Result<bool> {
    if !force_stat {
        match hint {
            Kind::Dir => return Ok(true),
            Kind::NonDir => return Ok(false),
            Kind::Unknown => {}
        }
    }
    stats.record_stat();
    let metadata = fs::symlink_metadata(path)?;
    Ok(metadata.file_type().is_dir())
}
