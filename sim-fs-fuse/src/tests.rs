//! 真实镜像文件上的端到端场景。

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use sim_fs::{Error, SimFileSystem};

use crate::BlockFile;

/// 100块（400KiB）的小镜像
const TEST_BLOCKS: usize = 100;

/// 70字节的ASCII测试串
const CONTENT: &[u8] = b"The quick brown fox jumps over the lazy dog in my new file system. OK!";

fn image_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sim-fs-{name}-{}.img", std::process::id()))
}

#[test]
fn directory_scenario() {
    let path = image_path("dir-scenario");
    let disk = Arc::new(BlockFile::create(&path, TEST_BLOCKS).unwrap());
    SimFileSystem::format(disk.clone()).unwrap();
    let mut fs = SimFileSystem::mount(disk).unwrap();

    let file1 = fs.create().unwrap();
    let file2 = fs.create().unwrap();
    let dir = fs.dir_create().unwrap();

    fs.dir_add(dir, "file1", file1).unwrap();
    assert_eq!(fs.dir_lookup(dir, "file1"), Ok(file1));
    assert_eq!(fs.dir_lookup(dir, "ghost"), Err(Error::NotFound));
    assert_eq!(fs.dir_add(dir, "file1", file2), Err(Error::AlreadyExists));
    assert_eq!(fs.dir_remove(dir, "file1"), Ok(file1));
    assert_eq!(fs.dir_lookup(dir, "file1"), Err(Error::NotFound));

    fs.unmount().unwrap();
    fs::remove_file(path).unwrap();
}

#[test]
fn write_then_read_back() {
    let path = image_path("write-read");
    let disk = Arc::new(BlockFile::create(&path, TEST_BLOCKS).unwrap());
    SimFileSystem::format(disk.clone()).unwrap();
    let mut fs = SimFileSystem::mount(disk).unwrap();

    assert_eq!(CONTENT.len(), 70);
    let inode = fs.create().unwrap();
    assert_eq!(fs.write(inode, CONTENT, 0), Ok(70));

    let mut buf = [0u8; 70];
    assert_eq!(fs.read(inode, &mut buf, 0), Ok(70));
    assert_eq!(&buf[..], CONTENT);

    fs.remove(inode).unwrap();
    fs.unmount().unwrap();
    fs::remove_file(path).unwrap();
}

#[test]
fn image_survives_reopen() {
    let path = image_path("reopen");
    let dir;
    let free;

    {
        let disk = Arc::new(BlockFile::create(&path, TEST_BLOCKS).unwrap());
        SimFileSystem::format(disk.clone()).unwrap();
        let mut fs = SimFileSystem::mount(disk).unwrap();

        dir = fs.dir_create().unwrap();
        let inode = fs.create().unwrap();
        fs.write(inode, CONTENT, 0).unwrap();
        fs.dir_add(dir, "fox", inode).unwrap();

        free = (fs.free_inodes(), fs.free_data_blocks());
        fs.unmount().unwrap();
    }

    let disk = Arc::new(BlockFile::open(&path).unwrap());
    let mut fs = SimFileSystem::mount(disk).unwrap();
    assert_eq!((fs.free_inodes(), fs.free_data_blocks()), free);

    let inode = fs.dir_lookup(dir, "fox").unwrap();
    let mut buf = [0u8; 70];
    assert_eq!(fs.read(inode, &mut buf, 0), Ok(70));
    assert_eq!(&buf[..], CONTENT);

    fs.unmount().unwrap();
    fs::remove_file(path).unwrap();
}
