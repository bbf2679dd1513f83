//! Decoding of `.dods` responses.
//!
//! A `.dods` body is the constrained DDS text, a `Data:` marker line, then
//! every variable serialized in XDR (big-endian). Arrays carry their element
//! count twice before the values; scalars carry no prefix. 8- and 16-bit
//! integers are widened to 32 bits except byte arrays, which are packed and
//! padded to a 4-byte boundary.

use bytes::Buf;

use crate::dds::{ArrayDecl, DapType, Dds, Declaration};
use crate::error::{OpendapError, OpendapResult};

/// Numeric values of one decoded array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Float32(v) => v.len(),
            ArrayValues::Float64(v) => v.len(),
            ArrayValues::Int(v) => v.len(),
            ArrayValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values as `f32`; text decodes to nothing.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            ArrayValues::Float32(v) => v.clone(),
            ArrayValues::Float64(v) => v.iter().map(|&x| x as f32).collect(),
            ArrayValues::Int(v) => v.iter().map(|&x| x as f32).collect(),
            ArrayValues::Text(_) => Vec::new(),
        }
    }

    /// Values as `f64`; text decodes to nothing.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ArrayValues::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ArrayValues::Float64(v) => v.clone(),
            ArrayValues::Int(v) => v.iter().map(|&x| x as f64).collect(),
            ArrayValues::Text(_) => Vec::new(),
        }
    }
}

/// A decoded array together with its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArray {
    pub decl: ArrayDecl,
    pub values: ArrayValues,
}

impl DecodedArray {
    pub fn name(&self) -> &str {
        &self.decl.name
    }
}

/// Detect a DAP2 `Error { code = ...; message = "..."; };` document.
pub fn server_error_message(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(4096)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();
    if !trimmed.starts_with("Error {") && !trimmed.starts_with("Error{") {
        return None;
    }
    let message = trimmed
        .split_once("message")
        .and_then(|(_, rest)| rest.split_once('"'))
        .and_then(|(_, rest)| rest.rsplit_once('"'))
        .map(|(msg, _)| msg.trim().to_string())
        .unwrap_or_else(|| trimmed.lines().take(4).collect::<Vec<_>>().join(" "));
    Some(message)
}

/// Split a `.dods` body into DDS text and binary payload.
fn split_body(body: &[u8]) -> OpendapResult<(&str, &[u8])> {
    const MARKERS: [&[u8]; 2] = [b"\nData:\n", b"\r\nData:\r\n"];

    for marker in MARKERS {
        if let Some(pos) = body.windows(marker.len()).position(|w| w == marker) {
            let dds = std::str::from_utf8(&body[..pos])
                .map_err(|e| OpendapError::Decode(format!("DDS section is not UTF-8: {}", e)))?;
            return Ok((dds, &body[pos + marker.len()..]));
        }
    }
    Err(OpendapError::Decode("missing 'Data:' marker".to_string()))
}

/// Decode a full `.dods` response into its arrays, in declaration order.
///
/// Grids contribute their data array followed by each map vector.
pub fn decode_response(body: &[u8]) -> OpendapResult<(Dds, Vec<DecodedArray>)> {
    if let Some(message) = server_error_message(body) {
        return Err(OpendapError::Server(message));
    }

    let (dds_text, mut payload) = split_body(body)?;
    let dds = Dds::parse(dds_text)?;

    let mut arrays = Vec::new();
    for decl in &dds.declarations {
        decode_declaration(decl, &mut payload, &mut arrays)?;
    }

    Ok((dds, arrays))
}

fn decode_declaration(
    decl: &Declaration,
    payload: &mut &[u8],
    out: &mut Vec<DecodedArray>,
) -> OpendapResult<()> {
    match decl {
        Declaration::Array(array) => out.push(decode_array(array, payload)?),
        Declaration::Grid { array, maps } => {
            out.push(decode_array(array, payload)?);
            for map in maps {
                out.push(decode_array(map, payload)?);
            }
        }
        Declaration::Structure { members, .. } => {
            for member in members {
                decode_declaration(member, payload, out)?;
            }
        }
    }
    Ok(())
}

fn need(payload: &[u8], bytes: usize, what: &str) -> OpendapResult<()> {
    if payload.remaining() < bytes {
        return Err(OpendapError::Decode(format!(
            "payload truncated reading {} (need {} bytes, have {})",
            what,
            bytes,
            payload.remaining()
        )));
    }
    Ok(())
}

fn decode_array(decl: &ArrayDecl, payload: &mut &[u8]) -> OpendapResult<DecodedArray> {
    let count = if decl.dims.is_empty() {
        1
    } else {
        need(payload, 8, &decl.name)?;
        let first = payload.get_u32() as usize;
        let second = payload.get_u32() as usize;
        if first != second {
            return Err(OpendapError::Decode(format!(
                "length prefixes disagree for {}: {} vs {}",
                decl.name, first, second
            )));
        }
        if first != decl.len() {
            return Err(OpendapError::Decode(format!(
                "{} declares {} values but payload has {}",
                decl.name,
                decl.len(),
                first
            )));
        }
        first
    };

    let values = match decl.dap_type {
        DapType::Float32 => {
            need(payload, count * 4, &decl.name)?;
            ArrayValues::Float32((0..count).map(|_| payload.get_f32()).collect())
        }
        DapType::Float64 => {
            need(payload, count * 8, &decl.name)?;
            ArrayValues::Float64((0..count).map(|_| payload.get_f64()).collect())
        }
        DapType::Int32 | DapType::Int16 => {
            need(payload, count * 4, &decl.name)?;
            ArrayValues::Int((0..count).map(|_| payload.get_i32() as i64).collect())
        }
        DapType::UInt32 | DapType::UInt16 => {
            need(payload, count * 4, &decl.name)?;
            ArrayValues::Int((0..count).map(|_| payload.get_u32() as i64).collect())
        }
        DapType::Byte => {
            let padded = if decl.dims.is_empty() { 4 } else { count.div_ceil(4) * 4 };
            need(payload, padded, &decl.name)?;
            let values = if decl.dims.is_empty() {
                // Scalar bytes are widened to a full XDR word.
                vec![(payload.get_u32() & 0xff) as i64]
            } else {
                let bytes: Vec<i64> = payload[..count].iter().map(|&b| b as i64).collect();
                payload.advance(padded);
                bytes
            };
            ArrayValues::Int(values)
        }
        DapType::String | DapType::Url => {
            let mut strings = Vec::with_capacity(count);
            for _ in 0..count {
                need(payload, 4, &decl.name)?;
                let len = payload.get_u32() as usize;
                let padded = len.div_ceil(4) * 4;
                need(payload, padded, &decl.name)?;
                strings.push(String::from_utf8_lossy(&payload[..len]).into_owned());
                payload.advance(padded);
            }
            ArrayValues::Text(strings)
        }
    };

    Ok(DecodedArray {
        decl: decl.clone(),
        values,
    })
}
