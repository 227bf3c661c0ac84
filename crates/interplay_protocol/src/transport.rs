use std::io::{self, Read, Write};
use std::sync::{Mutex, PoisonError, mpsc};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::warn;

use crate::protocol::{ClientMessage, ServerMessage};

/// Transport trait for the client side (sends ClientMessage, receives ServerMessage).
pub trait ClientTransport: Send + Sync + 'static {
    fn send(&self, msg: ClientMessage);
    fn receive(&self) -> Vec<ServerMessage>;
}

/// Transport trait for the server side (sends ServerMessage, receives ClientMessage).
pub trait ServerTransport: Send + Sync + 'static {
    fn send(&self, client_id: u64, msg: ServerMessage);
    fn broadcast(&self, msg: ServerMessage);
    fn receive(&self) -> Vec<(u64, ClientMessage)>;
}

// --- Serialization helpers (length-prefixed bincode framing) ---

/// Largest compressed frame `read_message` accepts.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Write a length-prefixed, zlib-compressed bincode message to a writer.
pub fn write_message<W: Write, T: serde::Serialize>(writer: &mut W, msg: &T) -> io::Result<()> {
    let data =
        bincode::serialize(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;
    let len = (compressed.len() as u32).to_be_bytes();
    writer.write_all(&len)?;
    writer.write_all(&compressed)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-prefixed, zlib-compressed bincode message from a reader.
pub fn read_message<R: Read, T: serde::de::DeserializeOwned>(reader: &mut R) -> io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit"),
        ));
    }
    let mut compressed = vec![0u8; len];
    reader.read_exact(&mut compressed)?;
    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut data = Vec::new();
    decoder.read_to_end(&mut data)?;
    bincode::deserialize(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn encode_frame<T: serde::Serialize>(msg: &T) -> Option<Vec<u8>> {
    let mut frame = Vec::new();
    match write_message(&mut frame, msg) {
        Ok(()) => Some(frame),
        Err(e) => {
            warn!("Dropping unencodable message: {}", e);
            None
        }
    }
}

fn decode_frames<T: serde::de::DeserializeOwned>(rx: &Mutex<mpsc::Receiver<Vec<u8>>>) -> Vec<T> {
    let rx = rx.lock().unwrap_or_else(PoisonError::into_inner);
    let mut messages = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        match read_message(&mut &frame[..]) {
            Ok(msg) => messages.push(msg),
            Err(e) => warn!("Dropping malformed frame: {}", e),
        }
    }
    messages
}

// --- Local transport (same-process via mpsc channels) ---

/// Local client transport. Messages travel as encoded frames so solo play
/// goes through the same codec as a remote connection would.
pub struct LocalClientTransport {
    tx: mpsc::Sender<Vec<u8>>,
    rx: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl ClientTransport for LocalClientTransport {
    fn send(&self, msg: ClientMessage) {
        if let Some(frame) = encode_frame(&msg) {
            let _ = self.tx.send(frame);
        }
    }

    fn receive(&self) -> Vec<ServerMessage> {
        decode_frames(&self.rx)
    }
}

/// Local server transport; the only client has id 0.
pub struct LocalServerTransport {
    tx: mpsc::Sender<Vec<u8>>,
    rx: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl ServerTransport for LocalServerTransport {
    fn send(&self, _client_id: u64, msg: ServerMessage) {
        if let Some(frame) = encode_frame(&msg) {
            let _ = self.tx.send(frame);
        }
    }

    fn broadcast(&self, msg: ServerMessage) {
        self.send(0, msg);
    }

    fn receive(&self) -> Vec<(u64, ClientMessage)> {
        decode_frames(&self.rx)
            .into_iter()
            .map(|msg| (0, msg))
            .collect()
    }
}

/// Create a pair of local transports connected by mpsc channels.
/// Used for solo play (client and server in the same process).
pub fn create_local_transport() -> (LocalClientTransport, LocalServerTransport) {
    let (client_tx, server_rx) = mpsc::channel();
    let (server_tx, client_rx) = mpsc::channel();
    (
        LocalClientTransport {
            tx: client_tx,
            rx: Mutex::new(client_rx),
        },
        LocalServerTransport {
            tx: server_tx,
            rx: Mutex::new(server_rx),
        },
    )
}
