//! World persistence: seed file plus one chunk blob per coordinate
//!
//! Layout of a save directory:
//!
//! ```text
//! <dir>/seed.txt        world seed, decimal
//! <dir>/<x>_<y>.chunk   one blob per chunk
//! ```
//!
//! A chunk blob is a 24-byte [`ChunkHeader`] followed by the block array,
//! optionally LZ4 compressed. Blobs written without a header (exactly
//! [`CHUNK_VOLUME`] raw bytes) are still readable in legacy mode.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::core::{Error, Result};
use crate::terrain::TerrainParams;
use crate::voxel::chunk::{Chunk, ChunkCoord, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_VOLUME, CHUNK_WIDTH};
use crate::voxel::world::World;

/// Name of the seed file inside a save directory
pub const SEED_FILE: &str = "seed.txt";

/// File extension of chunk blobs
pub const CHUNK_EXTENSION: &str = "chunk";

/// Magic bytes at the start of every chunk blob
pub const CHUNK_MAGIC: [u8; 4] = *b"TSCK";

/// Current chunk blob version
pub const FORMAT_VERSION: u16 = 1;

/// Size of [`ChunkHeader`] in bytes
pub const HEADER_SIZE: usize = std::mem::size_of::<ChunkHeader>();

/// Header flag: payload is LZ4 compressed with a prepended size
pub const FLAG_LZ4: u16 = 1 << 0;

const TEMP_SUFFIX: &str = ".tmp";

/// On-disk chunk header. All multi-byte fields are little-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ChunkHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub length: u16,
    pub width: u16,
    pub height: u16,
    pub _pad: u16,
    pub payload_len: u32,
    /// FNV-1a over the decoded block array
    pub checksum: u32,
}

impl ChunkHeader {
    fn new(flags: u16, payload_len: u32, checksum: u32) -> Self {
        Self {
            magic: CHUNK_MAGIC,
            version: FORMAT_VERSION.to_le(),
            flags: flags.to_le(),
            length: (CHUNK_LENGTH as u16).to_le(),
            width: (CHUNK_WIDTH as u16).to_le(),
            height: (CHUNK_HEIGHT as u16).to_le(),
            _pad: 0,
            payload_len: payload_len.to_le(),
            checksum: checksum.to_le(),
        }
    }

    /// Read a header from the front of `bytes`, converting to native order
    fn read(bytes: &[u8]) -> Option<Self> {
        let raw: ChunkHeader = bytemuck::pod_read_unaligned(bytes.get(..HEADER_SIZE)?);
        Some(Self {
            magic: raw.magic,
            version: u16::from_le(raw.version),
            flags: u16::from_le(raw.flags),
            length: u16::from_le(raw.length),
            width: u16::from_le(raw.width),
            height: u16::from_le(raw.height),
            _pad: u16::from_le(raw._pad),
            payload_len: u32::from_le(raw.payload_len),
            checksum: u32::from_le(raw.checksum),
        })
    }
}

/// Reasons a chunk blob is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkFormatError {
    #[error("missing chunk magic")]
    BadMagic,

    #[error("unsupported chunk format version {0}")]
    UnsupportedVersion(u16),

    #[error("chunk dimensions {0}x{1}x{2} do not match this build")]
    DimensionMismatch(u16, u16, u16),

    #[error("truncated chunk: expected {expected} payload bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("LZ4 decompression failed: {0}")]
    Decompress(String),

    #[error("decoded chunk has {0} bytes, expected {CHUNK_VOLUME}")]
    WrongSize(usize),

    #[error("checksum mismatch: header {expected:#010x}, data {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// 32-bit FNV-1a hash
pub fn checksum(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    bytes
        .iter()
        .fold(OFFSET_BASIS, |hash, &byte| (hash ^ byte as u32).wrapping_mul(PRIME))
}

/// File name of the chunk at `coord`, e.g. `-3_12.chunk`
pub fn chunk_file_name(coord: ChunkCoord) -> String {
    format!("{}_{}.{}", coord.x, coord.y, CHUNK_EXTENSION)
}

/// Parse a chunk file name. Only the exact form produced by
/// [`chunk_file_name`] is accepted, so two names never map to one coordinate.
pub fn parse_chunk_file_name(name: &str) -> Option<ChunkCoord> {
    let stem = name.strip_suffix(CHUNK_EXTENSION)?.strip_suffix('.')?;
    let (x, y) = stem.split_once('_')?;
    let coord = ChunkCoord::new(x.parse().ok()?, y.parse().ok()?);
    (chunk_file_name(coord) == name).then_some(coord)
}

/// Serialize a chunk into a versioned blob
pub fn encode_chunk(chunk: &Chunk, compress: bool) -> Vec<u8> {
    let blocks = chunk.as_bytes();
    let (flags, payload) = if compress {
        (FLAG_LZ4, lz4_flex::compress_prepend_size(blocks))
    } else {
        (0, blocks.to_vec())
    };

    let header = ChunkHeader::new(flags, payload.len() as u32, checksum(blocks));
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(&payload);
    bytes
}

/// Deserialize a chunk blob. With `legacy_compat`, a headerless blob of
/// exactly [`CHUNK_VOLUME`] bytes is read as a raw block array.
pub fn decode_chunk(bytes: &[u8], legacy_compat: bool) -> std::result::Result<Chunk, ChunkFormatError> {
    match decode_versioned(bytes) {
        Err(ChunkFormatError::BadMagic) if legacy_compat && bytes.len() == CHUNK_VOLUME => {
            Chunk::from_bytes(bytes).ok_or(ChunkFormatError::WrongSize(bytes.len()))
        }
        result => result,
    }
}

fn decode_versioned(bytes: &[u8]) -> std::result::Result<Chunk, ChunkFormatError> {
    let header = ChunkHeader::read(bytes).ok_or(ChunkFormatError::BadMagic)?;
    if header.magic != CHUNK_MAGIC {
        return Err(ChunkFormatError::BadMagic);
    }
    if header.version != FORMAT_VERSION {
        return Err(ChunkFormatError::UnsupportedVersion(header.version));
    }
    if (header.length as usize, header.width as usize, header.height as usize)
        != (CHUNK_LENGTH, CHUNK_WIDTH, CHUNK_HEIGHT)
    {
        return Err(ChunkFormatError::DimensionMismatch(header.length, header.width, header.height));
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != header.payload_len as usize {
        return Err(ChunkFormatError::Truncated {
            expected: header.payload_len as usize,
            actual: payload.len(),
        });
    }

    let blocks = if header.flags & FLAG_LZ4 != 0 {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| ChunkFormatError::Decompress(e.to_string()))?
    } else {
        payload.to_vec()
    };

    let actual = checksum(&blocks);
    if actual != header.checksum {
        return Err(ChunkFormatError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    Chunk::from_bytes(&blocks).ok_or(ChunkFormatError::WrongSize(blocks.len()))
}

/// Write via a temporary sibling and rename into place
fn write_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TEMP_SUFFIX);
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn is_chunk_artifact(name: &str) -> bool {
    let name = name.strip_suffix(TEMP_SUFFIX).unwrap_or(name);
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == CHUNK_EXTENSION)
}

/// Save the whole world to `dir`, replacing any previous save there.
///
/// Returns the number of chunks written.
pub fn save_world(dir: &Path, world: &World, compress: bool) -> Result<usize> {
    fs::create_dir_all(dir)?;

    // Chunks from an earlier save that this world no longer has must not
    // survive into the next load.
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name().to_str().is_some_and(is_chunk_artifact) {
            fs::remove_file(entry.path())?;
        }
    }

    write_replace(&dir.join(SEED_FILE), format!("{}\n", world.seed()).as_bytes())?;

    let chunks = world.snapshot();
    for (coord, chunk) in &chunks {
        write_replace(&dir.join(chunk_file_name(*coord)), &encode_chunk(chunk, compress))?;
        log::trace!("Saved chunk {:?}", coord);
    }

    log::info!(
        "Saved world (seed {}) with {} chunks to {}",
        world.seed(),
        chunks.len(),
        dir.display()
    );
    Ok(chunks.len())
}

/// Load a world saved by [`save_world`].
///
/// Returns `Ok(None)` when `dir` does not exist. Any malformed content fails
/// the whole load; a partially read world is never returned.
pub fn load_world(dir: &Path, params: &TerrainParams, legacy_compat: bool) -> Result<Option<World>> {
    if !dir.exists() {
        log::info!("No saved world at {}", dir.display());
        return Ok(None);
    }

    let seed = read_seed(&dir.join(SEED_FILE))?;

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        // Chunk files always have ASCII names
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            log::warn!("Ignoring file with non UTF-8 name {}", path.display());
            continue;
        };
        if name.ends_with(TEMP_SUFFIX) {
            log::warn!("Ignoring leftover temporary file {}", path.display());
            continue;
        }
        if is_chunk_artifact(&name) {
            names.push(name);
        }
    }
    names.sort_unstable();

    let world = World::with_params(seed, params.clone());
    for name in names {
        let path = dir.join(&name);
        let coord = parse_chunk_file_name(&name)
            .ok_or_else(|| Error::corrupt(&path, "malformed chunk file name"))?;
        let bytes = fs::read(&path)?;
        let chunk =
            decode_chunk(&bytes, legacy_compat).map_err(|e| Error::corrupt(&path, e.to_string()))?;
        world.add_chunk(coord, Arc::new(chunk));
    }

    log::info!(
        "Loaded world (seed {}) with {} chunks from {}",
        seed,
        world.len(),
        dir.display()
    );
    Ok(Some(world))
}

fn read_seed(path: &Path) -> Result<u32> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::corrupt(path, "seed file missing"));
        }
        Err(e) => return Err(e.into()),
    };
    text.trim()
        .parse::<u32>()
        .map_err(|e| Error::corrupt(path, format!("invalid seed {:?}: {}", text.trim(), e)))
}
