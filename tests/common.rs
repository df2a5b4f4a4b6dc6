#![allow(dead_code)]

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
    process::{Command, Output, Stdio},
};

use tempfile::NamedTempFile;

/// Sparse file standing in for `/dev/mem`, `len` bytes long.
pub fn backing(len: u64) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create backing file");
    file.as_file().set_len(len).expect("size backing file");
    file
}

pub fn poke(file: &NamedTempFile, offset: u64, data: &[u8]) {
    let mut handle = File::options()
        .write(true)
        .open(file.path())
        .expect("open backing for write");
    handle.seek(SeekFrom::Start(offset)).expect("seek");
    handle.write_all(data).expect("seed backing");
}

pub fn peek(file: &NamedTempFile, offset: u64, len: usize) -> Vec<u8> {
    let mut handle = File::open(file.path()).expect("open backing for read");
    handle.seek(SeekFrom::Start(offset)).expect("seek");
    let mut out = vec![0u8; len];
    handle.read_exact(&mut out).expect("read backing");
    out
}

/// Run the bridge against `device`, feed it `input`, close stdin and wait for it to exit.
pub fn run_bridge(device: &Path, input: &[u8], log_filter: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_regbridge"))
        .arg("--device")
        .arg(device)
        .env("RUST_LOG", log_filter)
        .env_remove("REGBRIDGE_WINDOW_SIZE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn regbridge");
    {
        let mut stdin = child.stdin.take().expect("child stdin");
        stdin.write_all(input).expect("write commands");
    }
    child.wait_with_output().expect("wait for regbridge")
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
