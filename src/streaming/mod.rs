//! World streaming: window diffing, pending adds and persistence

pub mod window;
pub mod pending;
pub mod controller;
pub mod disk_io;

pub use window::{MAX_WINDOW_RADIUS, StreamingWindow, diff_windows};
pub use pending::{DrainReport, PendingAdds, StreamingStats};
pub use controller::StreamingController;
pub use disk_io::{
    ChunkFormatError, ChunkHeader, SEED_FILE, chunk_file_name, decode_chunk, encode_chunk, load_world,
    parse_chunk_file_name, save_world,
};
