//! 目录层的行为测试：线性扫描、查重、墓碑复用与类型检查。

mod common;

use common::setup;
use sim_fs::{DiskInodeKind, Error, DirEntry};

const TEST_BLOCKS: usize = 100;

#[test]
fn add_then_lookup() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let file = fs.create().unwrap();

    assert_eq!(fs.dir_lookup(dir, "fox"), Err(Error::NotFound));
    fs.dir_add(dir, "fox", file).unwrap();
    assert_eq!(fs.dir_lookup(dir, "fox"), Ok(file));
}

#[test]
fn duplicate_names_are_rejected() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let first = fs.create().unwrap();
    let second = fs.create().unwrap();

    fs.dir_add(dir, "fox", first).unwrap();
    assert_eq!(fs.dir_add(dir, "fox", second), Err(Error::AlreadyExists));
    // 查重失败不写入任何记录
    assert_eq!(fs.dir_lookup(dir, "fox"), Ok(first));
    assert_eq!(fs.inode_meta(dir).unwrap().1 as usize, DirEntry::SIZE);
}

#[test]
fn remove_leaves_a_tombstone() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let file = fs.create().unwrap();

    fs.dir_add(dir, "fox", file).unwrap();
    let size = fs.inode_meta(dir).unwrap().1;

    assert_eq!(fs.dir_remove(dir, "fox"), Ok(file));
    assert_eq!(fs.dir_lookup(dir, "fox"), Err(Error::NotFound));
    assert_eq!(fs.dir_remove(dir, "fox"), Err(Error::NotFound));
    // 删除只写墓碑，目录大小不缩
    assert_eq!(fs.inode_meta(dir).unwrap().1, size);
}

#[test]
fn tombstones_are_reused() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let inodes: Vec<u32> = (0..3).map(|_| fs.create().unwrap()).collect();

    fs.dir_add(dir, "a", inodes[0]).unwrap();
    fs.dir_add(dir, "b", inodes[1]).unwrap();
    fs.dir_add(dir, "c", inodes[2]).unwrap();
    let size = fs.inode_meta(dir).unwrap().1;
    assert_eq!(size as usize, 3 * DirEntry::SIZE);

    fs.dir_remove(dir, "b").unwrap();

    // 新记录落进最早的墓碑，目录不增长
    let fresh = fs.create().unwrap();
    fs.dir_add(dir, "d", fresh).unwrap();
    assert_eq!(fs.inode_meta(dir).unwrap().1, size);
    assert_eq!(fs.dir_lookup(dir, "d"), Ok(fresh));

    // 墓碑用尽后回到末尾追加
    let last = fs.create().unwrap();
    fs.dir_add(dir, "e", last).unwrap();
    assert_eq!(fs.inode_meta(dir).unwrap().1 as usize, 4 * DirEntry::SIZE);
}

#[test]
fn removed_name_can_be_added_again() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let first = fs.create().unwrap();
    let second = fs.create().unwrap();

    fs.dir_add(dir, "fox", first).unwrap();
    fs.dir_remove(dir, "fox").unwrap();
    fs.dir_add(dir, "fox", second).unwrap();
    assert_eq!(fs.dir_lookup(dir, "fox"), Ok(second));
}

#[test]
fn name_length_limit() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let file = fs.create().unwrap();

    let longest = "x".repeat(27);
    fs.dir_add(dir, &longest, file).unwrap();
    assert_eq!(fs.dir_lookup(dir, &longest), Ok(file));

    let too_long = "x".repeat(28);
    assert_eq!(fs.dir_add(dir, &too_long, file), Err(Error::NameTooLong));
}

#[test]
fn directory_ops_require_a_directory() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let file = fs.create().unwrap();

    assert_eq!(fs.dir_add(file, "fox", 1), Err(Error::NotADirectory));
    assert_eq!(fs.dir_lookup(file, "fox"), Err(Error::NotADirectory));
    assert_eq!(fs.dir_remove(file, "fox"), Err(Error::NotADirectory));
    // 从未创建的 inode 同样不是目录
    assert_eq!(fs.dir_lookup(7, "fox"), Err(Error::NotADirectory));
}

#[test]
fn directory_grows_across_blocks() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let file = fs.create().unwrap();

    // 一块装128条记录，130条迫使目录跨块
    for i in 0..130 {
        fs.dir_add(dir, &format!("f{i:03}"), file).unwrap();
    }
    assert_eq!(fs.inode_meta(dir).unwrap().1 as usize, 130 * DirEntry::SIZE);
    assert_eq!(fs.dir_lookup(dir, "f000"), Ok(file));
    assert_eq!(fs.dir_lookup(dir, "f129"), Ok(file));

    // 第二块里的墓碑同样可复用
    fs.dir_remove(dir, "f129").unwrap();
    fs.dir_add(dir, "tail", file).unwrap();
    assert_eq!(fs.inode_meta(dir).unwrap().1 as usize, 130 * DirEntry::SIZE);
}

#[test]
fn dangling_entries_are_the_callers_problem() {
    let (_disk, mut fs) = setup(TEST_BLOCKS);
    let dir = fs.dir_create().unwrap();
    let file = fs.create().unwrap();

    fs.dir_add(dir, "fox", file).unwrap();
    fs.remove(file).unwrap();
    assert_eq!(fs.inode_meta(file), Ok((DiskInodeKind::Free, 0)));

    // 删除 inode 不清理目录里指向它的记录
    assert_eq!(fs.dir_lookup(dir, "fox"), Ok(file));
}
