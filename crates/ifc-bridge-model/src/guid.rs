// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC global ids (`IfcGloballyUniqueId`)
//!
//! A global id is a 128-bit number written as 22 characters of a base-64
//! alphabet that differs from RFC 4648. The first two characters carry the
//! top byte; each following group of four carries three bytes.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Characters in an encoded global id
pub const GLOBAL_ID_LEN: usize = 22;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuidError {
    #[error("global id must have 22 characters, found {0}")]
    Length(usize),
    #[error("invalid global id character {0:?}")]
    Character(char),
    #[error("global id value exceeds 128 bits")]
    Overflow,
}

fn digit(c: u8) -> Result<u32, GuidError> {
    ALPHABET
        .iter()
        .position(|&a| a == c)
        .map(|p| p as u32)
        .ok_or(GuidError::Character(c as char))
}

fn decode_group(chars: &[u8]) -> Result<u32, GuidError> {
    chars
        .iter()
        .try_fold(0u32, |acc, &c| Ok(acc * 64 + digit(c)?))
}

/// Validated 22 character global id
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(Uuid);

impl GlobalId {
    pub fn parse(text: &str) -> Result<Self, GuidError> {
        let bytes = text.as_bytes();
        if bytes.len() != GLOBAL_ID_LEN {
            return Err(GuidError::Length(text.chars().count()));
        }
        let mut out = [0u8; 16];
        let head = decode_group(&bytes[..2])?;
        if head > 0xff {
            return Err(GuidError::Overflow);
        }
        out[0] = head as u8;
        for (i, chunk) in bytes[2..].chunks(4).enumerate() {
            let value = decode_group(chunk)?;
            out[1 + 3 * i] = (value >> 16) as u8;
            out[2 + 3 * i] = (value >> 8) as u8;
            out[3 + 3 * i] = value as u8;
        }
        Ok(Self(Uuid::from_bytes(out)))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// The 22 character form
    pub fn encode(&self) -> String {
        let bytes = self.0.as_bytes();
        let mut out = String::with_capacity(GLOBAL_ID_LEN);
        let mut push = |value: u32, digits: usize| {
            for shift in (0..digits).rev() {
                out.push(ALPHABET[((value >> (6 * shift)) & 63) as usize] as char);
            }
        };
        push(u32::from(bytes[0]), 2);
        for chunk in bytes[1..].chunks(3) {
            let value =
                (u32::from(chunk[0]) << 16) | (u32::from(chunk[1]) << 8) | u32::from(chunk[2]);
            push(value, 4);
        }
        out
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalId({})", self.encode())
    }
}
