//! Blocking client for the subset of the MPD text protocol this tool needs.
use log::debug;
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// MPD's `ACK` code for a missing sticker (or any missing object).
const ACK_NO_EXIST: u32 = 50;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The daemon rejected a command.
    #[error("{command} failed with code {code}: {message}")]
    Ack {
        code: u32,
        command: String,
        message: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One entry of a `listallinfo` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub pairs: Vec<(String, String)>,
}

impl Record {
    /// Song path relative to the music directory, if this record is a song.
    pub fn into_file(self) -> Option<String> {
        self.pairs
            .into_iter()
            .find(|(k, _)| k == "file")
            .map(|(_, v)| v)
    }
}

pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    version: String,
    closed: bool,
}

impl Client {
    /// Connects and consumes the `OK MPD <version>` greeting. `timeout` applies
    /// to the connect itself and to every later read and write.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("couldn't resolve {}:{}", host, port),
            )
        })?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let mut client = Client {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            version: String::new(),
            closed: false,
        };

        let greeting = client.read_line()?;
        client.version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| Error::Protocol(format!("unexpected greeting {:?}", greeting)))?
            .to_string();
        debug!("connected to MPD {} at {}", client.version, addr);

        Ok(client)
    }

    /// Protocol version announced by the daemon.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn password(&mut self, password: &str) -> Result<()> {
        self.command("password", &[password])?;
        Ok(())
    }

    pub fn listallinfo(&mut self, root: &str) -> Result<Vec<Record>> {
        let pairs = self.command("listallinfo", &[root])?;

        let mut records = Vec::new();
        let mut current = Record::default();
        for (key, value) in pairs {
            let starts_record = matches!(key.as_str(), "file" | "directory" | "playlist");
            if starts_record && !current.pairs.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            current.pairs.push((key, value));
        }
        if !current.pairs.is_empty() {
            records.push(current);
        }

        Ok(records)
    }

    pub fn sticker_set(&mut self, uri: &str, key: &str, value: &str) -> Result<()> {
        self.command("sticker", &["set", "song", uri, key, value])?;
        Ok(())
    }

    /// Returns `None` when the song has no sticker named `key`.
    pub fn sticker_get(&mut self, uri: &str, key: &str) -> Result<Option<String>> {
        let pairs = match self.command("sticker", &["get", "song", uri, key]) {
            Ok(pairs) => pairs,
            Err(Error::Ack { code, .. }) if code == ACK_NO_EXIST => return Ok(None),
            Err(e) => return Err(e),
        };

        let (_, sticker) = pairs
            .into_iter()
            .find(|(k, _)| k == "sticker")
            .ok_or_else(|| Error::Protocol(format!("missing sticker line for {:?}", key)))?;
        let value = sticker
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| Error::Protocol(format!("malformed sticker {:?}", sticker)))?;

        Ok(Some(value.to_string()))
    }

    /// Asks the daemon to drop the connection. Dropping the client does the
    /// same on a best-effort basis.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.writer.write_all(b"close\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn command(&mut self, name: &str, args: &[&str]) -> Result<Vec<(String, String)>> {
        let mut line = String::from(name);
        for arg in args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut pairs = Vec::new();
        loop {
            let line = self.read_line()?;
            if line == "OK" {
                return Ok(pairs);
            }
            if line.starts_with("ACK ") {
                return Err(parse_ack(&line));
            }
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| Error::Protocol(format!("unexpected line {:?}", line)))?;
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by MPD",
            )
            .into());
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(line)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self
                .writer
                .write_all(b"close\n")
                .and_then(|_| self.writer.flush());
        }
    }
}

fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

// ACK [50@0] {sticker} no such sticker
fn parse_ack(line: &str) -> Error {
    let parsed = (|| {
        let rest = line.strip_prefix("ACK [")?;
        let (code, rest) = rest.split_once('@')?;
        let (_, rest) = rest.split_once("] {")?;
        let (command, message) = rest.split_once('}')?;
        Some(Error::Ack {
            code: code.parse().ok()?,
            command: command.to_string(),
            message: message.trim().to_string(),
        })
    })();

    parsed.unwrap_or_else(|| Error::Protocol(format!("malformed ACK {:?}", line)))
}
