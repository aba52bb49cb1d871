//! OSC 1.0 message encoding and decoding.
//!
//! Only single messages are supported (no bundles). Type tags: `i`, `f`,
//! `s`, `T`, `F`.

use crate::error::{Result, WatchError};
use std::fmt;

/// A single OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
    Bool(bool),
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Int(v) => write!(f, "{}", v),
            OscArg::Float(v) => write!(f, "{}", v),
            OscArg::Str(v) => write!(f, "{:?}", v),
            OscArg::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// An address plus its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new<S: Into<String>>(address: S, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Serialize into a datagram payload
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.address.len() + 8 + self.args.len() * 8);
        write_padded_str(&mut buf, &self.address);

        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(',');
        tags.extend(self.args.iter().map(OscArg::type_tag));
        write_padded_str(&mut buf, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
                OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(v) => write_padded_str(&mut buf, v),
                OscArg::Bool(_) => {}
            }
        }

        buf
    }

    /// Parse a datagram payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader { data, pos: 0 };

        let address = reader.read_str()?;
        if !address.starts_with('/') {
            return Err(WatchError::protocol(format!(
                "address must start with '/': {:?}",
                address
            )));
        }

        // Messages without a type tag string are legal in old senders; treat as no args.
        if reader.remaining() == 0 {
            return Ok(Self::new(address, Vec::new()));
        }

        let tags = reader.read_str()?;
        let tags = tags
            .strip_prefix(',')
            .ok_or_else(|| WatchError::protocol("type tag string must start with ','"))?;

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                'i' => OscArg::Int(i32::from_be_bytes(reader.read_word()?)),
                'f' => OscArg::Float(f32::from_be_bytes(reader.read_word()?)),
                's' => OscArg::Str(reader.read_str()?),
                'T' => OscArg::Bool(true),
                'F' => OscArg::Bool(false),
                other => {
                    return Err(WatchError::protocol(format!(
                        "unsupported type tag '{}'",
                        other
                    )))
                }
            };
            args.push(arg);
        }

        Ok(Self::new(address, args))
    }
}

impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// NUL-terminate and pad to a multiple of four bytes
fn write_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    let padding = 4 - (s.len() % 4);
    buf.extend(std::iter::repeat(0u8).take(padding));
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_word(&mut self) -> Result<[u8; 4]> {
        if self.remaining() < 4 {
            return Err(WatchError::protocol("truncated argument"));
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(word)
    }

    fn read_str(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| WatchError::protocol("unterminated string"))?;

        let s = std::str::from_utf8(&rest[..end])
            .map_err(|e| WatchError::protocol(format!("invalid UTF-8: {}", e)))?
            .to_string();

        let padded = (end / 4 + 1) * 4;
        if padded > rest.len() {
            return Err(WatchError::protocol("string padding runs past end of packet"));
        }
        self.pos += padded;
        Ok(s)
    }
}
