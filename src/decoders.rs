//! Stream filter decoders.
//!
//! Applies the `/Filter` pipeline of a stream dictionary to its raw bytes.
//! FlateDecode (zlib) covers the vast majority of real content streams;
//! any other filter name passes the bytes through unchanged with a debug
//! note, leaving image-layer filters such as DCTDecode compressed for the
//! image extractor to classify.

use crate::error::{Error, Result};
use crate::object::Object;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Cap on decompressed output, as protection against decompression bombs.
const MAX_DECOMPRESSED_SIZE: u64 = 100 * 1024 * 1024;

/// Decompress FlateDecode (zlib) data.
pub fn flate_decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input).take(MAX_DECOMPRESSED_SIZE);
    let mut output = Vec::new();

    decoder
        .read_to_end(&mut output)
        .map_err(|e| Error::Decode(format!("FlateDecode failed: {}", e)))?;

    if output.len() as u64 >= MAX_DECOMPRESSED_SIZE {
        return Err(Error::Decode("FlateDecode output exceeds size limit".to_string()));
    }

    Ok(output)
}

/// Extract the filter names from a (resolved) `/Filter` entry.
///
/// The entry may be a single Name or an Array of Names applied
/// left-to-right. `None` or Null means no filtering.
pub fn filter_names(filter: Option<&Object>) -> Result<Vec<String>> {
    match filter {
        None | Some(Object::Null) => Ok(Vec::new()),
        Some(Object::Name(name)) => Ok(vec![name.clone()]),
        Some(Object::Array(arr)) => arr
            .iter()
            .map(|o| {
                o.as_name()
                    .map(str::to_string)
                    .ok_or_else(|| Error::Decode("non-name entry in /Filter array".to_string()))
            })
            .collect(),
        Some(other) => Err(Error::Decode(format!(
            "/Filter must be a name or array, found {}",
            other.type_name()
        ))),
    }
}

/// Decode stream data through its filter pipeline.
///
/// `filter` must already be resolved (the /Filter entry itself may be an
/// indirect reference in the file). Filters apply left-to-right;
/// unrecognized names pass bytes through unchanged.
pub fn decode_stream(data: &[u8], filter: Option<&Object>) -> Result<Vec<u8>> {
    let names = filter_names(filter)?;

    let mut current = data.to_vec();
    for name in &names {
        current = match name.as_str() {
            "FlateDecode" | "Fl" => flate_decode(&current)?,
            other => {
                log::debug!("unrecognized filter {:?}, passing data through", other);
                current
            },
        };
    }

    Ok(current)
}
