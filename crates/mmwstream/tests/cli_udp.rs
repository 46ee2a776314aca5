#![cfg(feature = "cli")]

use std::net::UdpSocket;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn free_udp_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .and_then(|socket| socket.local_addr())
        .expect("ephemeral port should be available")
        .port()
}

fn spawn_udp(port: u16, extra: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_mmwstream"))
        .args(["--log-level", "error", "--format", "json", "udp", "127.0.0.1"])
        .arg(port.to_string())
        .args(["--frame-size", "64", "--timeout", "100ms"])
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("udp command should start")
}

/// Send `datagram` until the child exits. The child may not be bound yet
/// when the first datagrams go out.
fn feed_until_exit(child: &mut Child, port: u16, datagram: &[u8]) -> i32 {
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender should bind");
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("child status") {
            return status.code().expect("exit code");
        }
        if start.elapsed() > Duration::from_secs(10) {
            let _ = child.kill();
            panic!("udp command did not exit");
        }
        let _ = sender.send_to(datagram, ("127.0.0.1", port));
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn udp_prints_requested_frame_count() {
    let port = free_udp_port();
    let mut child = spawn_udp(port, &["--count", "2"]);

    let code = feed_until_exit(&mut child, port, &[0xAB; 64]);
    assert_eq!(code, 0);

    let output = child.wait_with_output().expect("child output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["kind"], "frame");
    assert_eq!(lines[0]["size"], 64);
    assert!(lines[0]["head"].as_str().unwrap_or("").starts_with("abab"));
    assert_eq!(lines[2]["frames"], 2);
}

#[test]
fn udp_size_mismatch_exits_60() {
    let port = free_udp_port();
    let mut child = spawn_udp(port, &[]);

    let code = feed_until_exit(&mut child, port, &[0u8; 10]);
    assert_eq!(code, 60);
}

#[test]
fn udp_invalid_frame_size_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_mmwstream"))
        .args(["udp", "127.0.0.1", "0", "--frame-size", "0"])
        .output()
        .expect("udp should run");
    assert_eq!(output.status.code(), Some(64));
}
