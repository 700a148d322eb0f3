#![allow(dead_code)]

use id3::frame::{Picture, PictureType};
use id3::{TagLike, Version};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{prelude::*, BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the fake daemon knows and what it was asked to do.
#[derive(Debug, Default)]
pub struct State {
    pub songs: Vec<String>,
    pub stickers: HashMap<(String, String), String>,
    /// Every command line received, in order.
    pub commands: Vec<Vec<String>>,
    pub password: Option<String>,
    /// `sticker set` for this key is answered with an ACK.
    pub reject_key: Option<String>,
}

impl State {
    pub fn sticker(&self, song: &str, key: &str) -> Option<&str> {
        self.stickers
            .get(&(song.to_string(), key.to_string()))
            .map(String::as_str)
    }

    pub fn sticker_keys(&self, song: &str) -> Vec<&str> {
        let mut keys: Vec<_> = self
            .stickers
            .keys()
            .filter(|(s, _)| s == song)
            .map(|(_, k)| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Keys of every `sticker set`, in the order they arrived.
    pub fn set_keys(&self) -> Vec<(&str, &str)> {
        self.commands
            .iter()
            .filter(|c| c.len() == 6 && c[0] == "sticker" && c[1] == "set")
            .map(|c| (c[3].as_str(), c[4].as_str()))
            .collect()
    }
}

/// A single-connection MPD stand-in on a loopback port.
pub struct FakeMpd {
    pub port: u16,
    state: Arc<Mutex<State>>,
    handle: JoinHandle<()>,
}

impl FakeMpd {
    pub fn start(state: State) -> FakeMpd {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(state));

        let handle = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                let (stream, _) = listener.accept().unwrap();
                serve(stream, &state);
            })
        };

        FakeMpd {
            port,
            state,
            handle,
        }
    }

    /// Waits for the client to disconnect and returns the final state.
    pub fn finish(self) -> State {
        self.handle.join().unwrap();
        Arc::try_unwrap(self.state).unwrap().into_inner().unwrap()
    }
}

fn serve(stream: TcpStream, state: &Mutex<State>) {
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut w = BufWriter::new(stream);
    let mut authenticated = state.lock().unwrap().password.is_none();

    writeln!(w, "OK MPD 0.23.5").unwrap();
    w.flush().unwrap();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let args = tokenize(line.trim_end_matches('\n'));
        let mut state = state.lock().unwrap();
        state.commands.push(args.clone());

        let reply = match args[0].as_str() {
            "close" => return,
            "password" => {
                if state.password.as_deref() == Some(args[1].as_str()) {
                    authenticated = true;
                    "OK\n".to_string()
                } else {
                    "ACK [3@0] {password} incorrect password\n".to_string()
                }
            }
            cmd if !authenticated => {
                format!("ACK [4@0] {{{}}} you don't have permission for \"{}\"\n", cmd, cmd)
            }
            "listallinfo" => {
                let mut reply = String::from("directory: albums\nLast-Modified: 2024-01-01T00:00:00Z\n");
                for song in &state.songs {
                    reply.push_str(&format!("file: {}\nTitle: {}\nTime: 180\n", song, song));
                }
                reply.push_str("playlist: favourites.m3u\nOK\n");
                reply
            }
            "sticker" if args[1] == "set" => {
                if state.reject_key.as_deref() == Some(args[4].as_str()) {
                    "ACK [2@0] {sticker} value too large\n".to_string()
                } else {
                    state
                        .stickers
                        .insert((args[3].clone(), args[4].clone()), args[5].clone());
                    "OK\n".to_string()
                }
            }
            "sticker" if args[1] == "get" => match state.sticker(&args[3], &args[4]) {
                Some(value) => format!("sticker: {}={}\nOK\n", args[4], value),
                None => "ACK [50@0] {sticker} no such sticker\n".to_string(),
            },
            cmd => format!("ACK [5@0] {{{}}} unknown command\n", cmd),
        };

        w.write_all(reply.as_bytes()).unwrap();
        w.flush().unwrap();
    }
}

fn tokenize(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c == ' ' {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut arg = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => arg.extend(chars.next()),
                    c => arg.push(c),
                }
            }
            args.push(arg);
        } else {
            let mut arg = String::new();
            while let Some(&c) = chars.peek() {
                if c == ' ' {
                    break;
                }
                arg.push(c);
                chars.next();
            }
            args.push(arg);
        }
    }
    args
}

/// A JPEG full of noise, so it stays large after thumbnailing.
pub fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    });

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode_image(&img)
        .unwrap();
    out
}

/// Writes an ID3v2.4 tag (with an APIC frame holding `picture`, if any)
/// followed by some padding where audio would be.
pub fn write_tagged(path: &Path, picture: Option<Vec<u8>>) {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).unwrap();
    }

    let mut tag = id3::Tag::new();
    tag.set_title("Track");
    tag.set_album("Album");
    if let Some(data) = picture {
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data,
        });
    }

    let mut file = File::create(path).unwrap();
    tag.write_to(&mut file, Version::Id3v24).unwrap();
    file.write_all(&[0; 256]).unwrap();
}

/// Writes a FLAC stream with no audio frames: a STREAMINFO block and, if
/// given, a PICTURE block holding `picture` as the front cover.
pub fn write_flac(path: &Path, picture: Option<&[u8]>) {
    fn block_header(out: &mut Vec<u8>, last: bool, kind: u8, len: usize) {
        out.push(if last { 0x80 | kind } else { kind });
        out.extend_from_slice(&(len as u32).to_be_bytes()[1..]);
    }

    let mut out = b"fLaC".to_vec();

    // STREAMINFO: 4096-sample blocks, 44.1 kHz, stereo, 16 bit, length unknown
    let mut info = Vec::new();
    info.extend_from_slice(&4096u16.to_be_bytes());
    info.extend_from_slice(&4096u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);
    let packed: u64 = (44_100 << 44) | (1 << 41) | (15 << 36);
    info.extend_from_slice(&packed.to_be_bytes());
    info.extend_from_slice(&[0; 16]);
    block_header(&mut out, picture.is_none(), 0, info.len());
    out.extend_from_slice(&info);

    if let Some(data) = picture {
        let mime = b"image/jpeg";
        let mut block = Vec::new();
        block.extend_from_slice(&3u32.to_be_bytes());
        block.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        block.extend_from_slice(mime);
        block.extend_from_slice(&0u32.to_be_bytes()); // description
        block.extend_from_slice(&[0; 16]); // width, height, depth, colors
        block.extend_from_slice(&(data.len() as u32).to_be_bytes());
        block.extend_from_slice(data);
        block_header(&mut out, true, 6, block.len());
        out.extend_from_slice(&block);
    }

    if let Some(parent) = path.parent() {
        create_dir_all(parent).unwrap();
    }
    std::fs::write(path, out).unwrap();
}
