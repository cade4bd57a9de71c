//! Scripted in-process OLT used by the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oltscope::transport::DeviceConfigBuilder;
use oltscope::{ClientOptions, DeviceConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Options with a short poll interval so tests run quickly.
pub fn fast_options() -> ClientOptions {
    ClientOptions {
        poll_interval: Duration::from_millis(10),
        ..ClientOptions::default()
    }
}

/// A unit the fake OLT knows about.
#[derive(Clone)]
pub struct Unit {
    pub port: &'static str,
    pub index: u32,
    pub description: &'static str,
    pub mac: &'static str,
    pub distance: u32,
    pub rtt: u32,
}

impl Unit {
    pub fn new(port: &'static str, index: u32, description: &'static str) -> Self {
        Self {
            port,
            index,
            description,
            mac: "00:11:22:33:44:55",
            distance: 100,
            rtt: 80,
        }
    }

    fn row(&self) -> String {
        format!(
            "EPON{}:{}   online   {}   {}   {}   2024/05/01 08:12:33   N/A   N/A   3 09:41:02\r\n",
            self.port, self.index, self.mac, self.distance, self.rtt
        )
    }
}

/// How the fake device behaves.
#[derive(Default)]
pub struct Script {
    pub units: Vec<Unit>,
    /// Ports that accept `interface epon`; empty means 0/1..0/4.
    pub ports: Vec<&'static str>,
    /// Number of enable attempts to reject before accepting.
    pub reject_enables: AtomicUsize,
    /// Land on the privileged prompt right after login.
    pub privileged_login: bool,
    /// Hold back the reply to one command.
    pub slow: Option<SlowReply>,
}

/// Delays the reply to `command` the first time it is received.
pub struct SlowReply {
    pub command: &'static str,
    pub delay: Duration,
    pending: AtomicUsize,
}

impl SlowReply {
    pub fn once(command: &'static str, delay: Duration) -> Self {
        Self {
            command,
            delay,
            pending: AtomicUsize::new(1),
        }
    }

    fn applies(&self, line: &str) -> bool {
        line == self.command
            && self
                .pending
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

impl Script {
    pub fn with_units(units: Vec<Unit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    fn port_exists(&self, port: &str) -> bool {
        if self.ports.is_empty() {
            ["0/1", "0/2", "0/3", "0/4"].contains(&port)
        } else {
            self.ports.contains(&port)
        }
    }

    fn unit(&self, port: &str, index: u32) -> Option<&Unit> {
        self.units
            .iter()
            .find(|unit| unit.port == port && unit.index == index)
    }
}

#[derive(Default)]
pub struct FakeStats {
    pub connections: AtomicUsize,
    pub logins: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

pub struct FakeOlt {
    addr: SocketAddr,
    pub stats: Arc<FakeStats>,
    task: JoinHandle<()>,
}

impl FakeOlt {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let script = Arc::new(script);
        let stats = Arc::new(FakeStats::default());

        let task = {
            let stats = stats.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    stats.connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(stream, script.clone(), stats.clone()));
                }
            })
        };

        Self { addr, stats, task }
    }

    /// Device config pointing at this fake, with short timeouts.
    pub fn config(&self, name: &str) -> DeviceConfigBuilder {
        DeviceConfig::builder(name, "127.0.0.1")
            .port(self.addr.port())
            .username("admin")
            .password("secret")
            .enable_password("enable-secret")
            .connect_timeout(Duration::from_secs(2))
            .login_timeout(Duration::from_secs(2))
            .command_timeout(Duration::from_secs(2))
            .context_timeout(Duration::from_secs(2))
    }

    pub fn connections(&self) -> usize {
        self.stats.connections.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.stats.logins.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.stats.commands.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }
}

impl Drop for FakeOlt {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Config for a device nobody listens on.
pub async fn unreachable_config(name: &str) -> DeviceConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    DeviceConfig::builder(name, "127.0.0.1")
        .port(port)
        .username("admin")
        .password("secret")
        .connect_timeout(Duration::from_secs(1))
        .build()
        .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Username,
    Password,
    User,
    EnablePassword,
    Privileged,
    Config,
    Interface(String),
}

fn prompt(mode: &Mode) -> String {
    match mode {
        Mode::Username => "Login: ".to_string(),
        Mode::Password | Mode::EnablePassword => "Password: ".to_string(),
        Mode::User => "OLT> ".to_string(),
        Mode::Privileged => "OLT# ".to_string(),
        Mode::Config => "OLT(config)# ".to_string(),
        Mode::Interface(port) => format!("OLT(config-pon-{port})# "),
    }
}

async fn serve(stream: TcpStream, script: Arc<Script>, stats: Arc<FakeStats>) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).split(b'\r');
    if write
        .write_all(b"\r\nWelcome to the EPON OLT\r\nLogin: ")
        .await
        .is_err()
    {
        return;
    }

    let mut mode = Mode::Username;
    while let Ok(Some(raw)) = lines.next_segment().await {
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        let reply = respond(&script, &stats, &mut mode, &line);
        if let Some(slow) = script.slow.as_ref().filter(|slow| slow.applies(&line)) {
            tokio::time::sleep(slow.delay).await;
        }
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn respond(script: &Script, stats: &FakeStats, mode: &mut Mode, line: &str) -> String {
    match mode {
        Mode::Username => {
            *mode = Mode::Password;
            return format!("{line}\r\n{}", prompt(mode));
        }
        Mode::Password => {
            stats.logins.fetch_add(1, Ordering::SeqCst);
            *mode = if script.privileged_login {
                Mode::Privileged
            } else {
                Mode::User
            };
            return format!("\r\n{}", prompt(mode));
        }
        Mode::EnablePassword => {
            let rejected = script
                .reject_enables
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                *mode = Mode::User;
                return format!("\r\n% Bad passwords\r\n{}", prompt(mode));
            }
            *mode = Mode::Privileged;
            return format!("\r\n{}", prompt(mode));
        }
        _ => {}
    }

    stats.commands.lock().unwrap().push(line.to_string());
    let body = execute(script, mode, line);
    format!("{line}\r\n{body}{}", prompt(mode))
}

fn execute(script: &Script, mode: &mut Mode, line: &str) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    let current = mode.clone();

    match (&current, words.as_slice()) {
        (Mode::User, ["enable"]) => {
            *mode = Mode::EnablePassword;
            String::new()
        }
        (Mode::User | Mode::Privileged, ["terminal", "length", "0"]) => String::new(),
        (Mode::Privileged, ["configure", "terminal"]) => {
            *mode = Mode::Config;
            String::new()
        }
        (Mode::Config, ["interface", "epon", port]) if script.port_exists(port) => {
            *mode = Mode::Interface(port.to_string());
            String::new()
        }
        (Mode::Config, ["interface", ..]) => "% Invalid input detected at '^' marker.\r\n".to_string(),
        (Mode::Config | Mode::Interface(_), ["end"]) => {
            *mode = Mode::Privileged;
            String::new()
        }
        (Mode::Interface(port), ["show", "onu", "info"]) => {
            let mut out = String::from(
                "OnuId       Status   MacAddress          Distance(m)  RTT(TQ)  LastRegTime          LastDeregTime  LastDeregReason  AliveTime\r\n\
                 ----------- -------- ------------------- ------------ -------- -------------------- -------------- ---------------- ----------\r\n",
            );
            for unit in script.units.iter().filter(|unit| unit.port == port.as_str()) {
                out.push_str(&unit.row());
            }
            out
        }
        (Mode::Interface(port), ["show", "onu", index, what]) => {
            let unit = index.parse().ok().and_then(|index| script.unit(port, index));
            match (unit, *what) {
                (None, _) => "% ONU is not exist\r\n".to_string(),
                (Some(unit), "description") => {
                    format!("ONU {}:{} description : {}\r\n", port, unit.index, unit.description)
                }
                (Some(_), "optical-transceiver-diagnosis") => "\
Temperature(C)          : 45.20\r\n\
Supply Voltage(V)       : 3.30\r\n\
TX Bias Current(mA)     : 12.00\r\n\
TX Power(dBm)           : 2.10\r\n\
RX Power(dBm)           : -18.40\r\n"
                    .to_string(),
                (Some(_), "port-state") => "Port State : Up\r\nProtection Tpye : none\r\n".to_string(),
                (Some(_), _) => "% Unknown command.\r\n".to_string(),
            }
        }
        _ => "% Unknown command.\r\n".to_string(),
    }
}
