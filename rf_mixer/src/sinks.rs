//! Pluggable output sinks for the mixer's int16 frames. Every sink owns
//! its reconnect policy; a transient failure is logged and retried on the
//! next frame rather than propagated, matching the non-fatal
//! `TransientSink` error variant.

use std::{
    io::Write,
    net::{TcpStream, UdpSocket},
    time::{Duration, Instant},
};

use base64::{engine::general_purpose, Engine as _};
use rf_audio_out::{PcmSource, Player};
use tokio::sync::broadcast;
use tracing::warn;

pub trait Sink: Send {
    fn send(&mut self, frame: &[i16]);
}

/// Plays the mixed stream through the system's default audio device.
pub struct LocalSink {
    _player_handle: Option<rf_audio_out::PlayHandle>,
    tx: std::sync::mpsc::Sender<i16>,
}

struct ChannelPcmSource {
    rx: std::sync::mpsc::Receiver<i16>,
    sample_rate: u32,
}

impl Iterator for ChannelPcmSource {
    type Item = i16;
    fn next(&mut self) -> Option<i16> {
        Some(self.rx.try_recv().unwrap_or(0))
    }
}

impl PcmSource for ChannelPcmSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl LocalSink {
    pub fn new(sample_rate: u32) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let source = ChannelPcmSource { rx, sample_rate };
        let handle = Player::new().ok().and_then(|player| player.play(Box::new(source)).ok());
        if handle.is_none() {
            warn!("local audio output unavailable; Local sink will discard samples");
        }
        Self { _player_handle: handle, tx }
    }
}

impl Sink for LocalSink {
    fn send(&mut self, frame: &[i16]) {
        for &sample in frame {
            let _ = self.tx.send(sample);
        }
    }
}

/// Raw int16 little-endian over UDP, `SAMPLES_PER_PACKET` samples per
/// datagram; reconnects the socket on send failure.
pub struct UdpSink {
    server_addr: String,
    socket: Option<UdpSocket>,
    pending: Vec<i16>,
    samples_per_packet: usize,
}

impl UdpSink {
    pub fn new(server_ip: String, server_port: u16) -> Self {
        Self {
            server_addr: format!("{server_ip}:{server_port}"),
            socket: UdpSocket::bind("0.0.0.0:0").ok(),
            pending: Vec::new(),
            samples_per_packet: 100,
        }
    }

    fn reconnect(&mut self) {
        self.socket = UdpSocket::bind("0.0.0.0:0").ok();
    }
}

impl Sink for UdpSink {
    fn send(&mut self, frame: &[i16]) {
        self.pending.extend_from_slice(frame);
        while self.pending.len() >= self.samples_per_packet {
            let packet: Vec<u8> = self.pending.drain(..self.samples_per_packet).flat_map(|s| s.to_le_bytes()).collect();
            let sent = self.socket.as_ref().map(|s| s.send_to(&packet, &self.server_addr).is_ok()).unwrap_or(false);
            if !sent {
                warn!("udp sink send failed, reconnecting");
                self.reconnect();
            }
        }
    }
}

/// HTTP PUT of the raw PCM16 stream to an Icecast mount point with Basic
/// auth. A full MP3 encode pipeline is out of scope here (no verified MP3
/// encoder crate in the source pack); this sink streams raw PCM16 bytes
/// instead, which Icecast forwards as an opaque byte stream to listeners
/// that know the source format out of band.
pub struct IcecastSink {
    url: String,
    password: String,
    stream: Option<TcpStream>,
    last_attempt: Instant,
    retry_backoff: Duration,
}

impl IcecastSink {
    pub fn new(url: String, password: String) -> Self {
        Self {
            url,
            password,
            stream: None,
            last_attempt: Instant::now() - Duration::from_secs(60),
            retry_backoff: Duration::from_secs(30),
        }
    }

    fn connect(&mut self) {
        let Some((host_port, path)) = parse_icecast_url(&self.url) else { return };
        let Ok(mut stream) = TcpStream::connect(&host_port) else { return };

        let auth = general_purpose::STANDARD.encode(format!("source:{}", self.password));
        let request = format!(
            "PUT {path} HTTP/1.1\r\nHost: {host_port}\r\nAuthorization: Basic {auth}\r\nContent-Type: audio/pcm\r\nTransfer-Encoding: chunked\r\n\r\n"
        );
        if stream.write_all(request.as_bytes()).is_ok() {
            self.stream = Some(stream);
        }
    }
}

impl Sink for IcecastSink {
    fn send(&mut self, frame: &[i16]) {
        if self.stream.is_none() {
            if self.last_attempt.elapsed() < self.retry_backoff {
                return;
            }
            self.last_attempt = Instant::now();
            self.connect();
        }

        let Some(stream) = &mut self.stream else { return };
        let bytes: Vec<u8> = frame.iter().flat_map(|s| s.to_le_bytes()).collect();
        let chunk = format!("{:x}\r\n", bytes.len());
        let ok = stream.write_all(chunk.as_bytes()).and_then(|_| stream.write_all(&bytes)).and_then(|_| stream.write_all(b"\r\n")).is_ok();
        if !ok {
            warn!("icecast sink write failed, will retry after backoff");
            self.stream = None;
            self.last_attempt = Instant::now();
        }
    }
}

/// Splits `http://host:port/mount` into `("host:port", "/mount")` without
/// pulling in a URL-parsing crate for one call site.
fn parse_icecast_url(raw: &str) -> Option<(String, String)> {
    let without_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let (host_port, path) = match without_scheme.split_once('/') {
        Some((hp, p)) => (hp, format!("/{p}")),
        None => (without_scheme, "/".to_string()),
    };
    let host_port = if host_port.contains(':') { host_port.to_string() } else { format!("{host_port}:8000") };
    Some((host_port, path))
}

/// One binary frame of `SAMPLES_PER_FRAME` int16 little-endian samples,
/// best-effort broadcast to every connected peer; dropped clients are
/// silently discarded by the broadcast channel's lagged-receiver handling.
pub struct WebSocketSink {
    tx: broadcast::Sender<Vec<u8>>,
    pending: Vec<i16>,
    samples_per_frame: usize,
}

impl WebSocketSink {
    pub fn new(tx: broadcast::Sender<Vec<u8>>, audio_sample_rate: u32) -> Self {
        Self {
            tx,
            pending: Vec::new(),
            samples_per_frame: (audio_sample_rate / 4).max(1) as usize,
        }
    }
}

impl Sink for WebSocketSink {
    fn send(&mut self, frame: &[i16]) {
        self.pending.extend_from_slice(frame);
        while self.pending.len() >= self.samples_per_frame {
            let bytes: Vec<u8> = self.pending.drain(..self.samples_per_frame).flat_map(|s| s.to_le_bytes()).collect();
            let _ = self.tx.send(bytes);
        }
    }
}
