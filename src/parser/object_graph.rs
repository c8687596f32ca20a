//! Keyed binary archive (`bplist00`) reader.
//!
//! A binary property list stores every object in a flat table addressed by
//! index, with a 32-byte trailer describing the offset table:
//!
//! ```text
//! "bplist00" | objects ... | offset table | trailer (32 bytes)
//! trailer: 6 unused | offset size | ref size | object count (u64) | top (u64) | table offset (u64)
//! ```
//!
//! A keyed archive is a plist whose top dictionary names its archiver under
//! `$archiver` and holds the archived objects in the `$objects` array. Object
//! references inside the archive are UIDs indexing that array.
//!
//! Only the subset needed to find strings is decoded. Every read is
//! bounds-checked and any inconsistency yields `None`.

use std::collections::HashSet;

use super::metadata::accept_candidate;
use super::{Candidate, select_longest};

const MAGIC: &[u8] = b"bplist00";
const TRAILER_LEN: usize = 32;

const EXPECTED_ARCHIVER: &str = "NSKeyedArchiver";
const ARCHIVER_KEY: &str = "$archiver";
const OBJECTS_KEY: &str = "$objects";
const STRING_PAYLOAD_KEY: &str = "NS.string";

const ASCII_STRING: u8 = 0x5;
const UTF16_STRING: u8 = 0x6;
const UID: u8 = 0x8;
const ARRAY: u8 = 0xA;
const DICT: u8 = 0xD;

/// The plist objects the reader cares about. Containers hold object-table indices.
#[derive(Debug, Clone, PartialEq)]
enum PlistObject {
    String(String),
    Uid(u64),
    Array(Vec<usize>),
    Dict(Vec<(usize, usize)>),
    Other,
}

/// Read-only view over a binary plist.
struct BinaryPlist<'a> {
    data: &'a [u8],
    offsets: Vec<usize>,
    ref_size: usize,
    top: usize,
}

impl<'a> BinaryPlist<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        if !data.starts_with(MAGIC) || data.len() < MAGIC.len() + TRAILER_LEN {
            return None;
        }

        let trailer_start = data.len() - TRAILER_LEN;
        let trailer = &data[trailer_start..];
        let offset_size = trailer[6] as usize;
        let ref_size = trailer[7] as usize;
        let object_count = usize::try_from(read_uint(&trailer[8..16])?).ok()?;
        let top = usize::try_from(read_uint(&trailer[16..24])?).ok()?;
        let table_offset = usize::try_from(read_uint(&trailer[24..32])?).ok()?;

        if !(1..=8).contains(&offset_size) || !(1..=8).contains(&ref_size) {
            return None;
        }
        if object_count == 0 || top >= object_count || object_count > data.len() {
            return None;
        }

        let table_len = object_count.checked_mul(offset_size)?;
        let table_end = table_offset.checked_add(table_len)?;
        if table_offset < MAGIC.len() || table_end > trailer_start {
            return None;
        }

        let offsets = data[table_offset..table_end]
            .chunks_exact(offset_size)
            .map(|raw| {
                let offset = usize::try_from(read_uint(raw)?).ok()?;
                (offset >= MAGIC.len() && offset < table_offset).then_some(offset)
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            data,
            offsets,
            ref_size,
            top,
        })
    }

    /// High nibble of the object's marker byte.
    fn kind(&self, index: usize) -> Option<u8> {
        let offset = *self.offsets.get(index)?;
        self.data.get(offset).map(|marker| marker >> 4)
    }

    fn object(&self, index: usize) -> Option<PlistObject> {
        let offset = *self.offsets.get(index)?;
        let marker = *self.data.get(offset)?;
        let low = marker & 0x0f;

        let object = match marker >> 4 {
            ASCII_STRING => {
                let (len, start) = self.read_length(offset, low)?;
                PlistObject::String(String::from_utf8_lossy(self.bytes(start, len)?).into_owned())
            }
            UTF16_STRING => {
                let (len, start) = self.read_length(offset, low)?;
                let raw = self.bytes(start, len.checked_mul(2)?)?;
                let units: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                PlistObject::String(String::from_utf16_lossy(&units))
            }
            UID => {
                let width = low as usize + 1;
                PlistObject::Uid(read_uint(self.bytes(offset + 1, width)?)?)
            }
            ARRAY => {
                let (len, start) = self.read_length(offset, low)?;
                PlistObject::Array(self.read_refs(start, len)?)
            }
            DICT => {
                let (len, start) = self.read_length(offset, low)?;
                let keys = self.read_refs(start, len)?;
                let values_start = start.checked_add(len.checked_mul(self.ref_size)?)?;
                let values = self.read_refs(values_start, len)?;
                PlistObject::Dict(keys.into_iter().zip(values).collect())
            }
            _ => PlistObject::Other,
        };

        Some(object)
    }

    fn top_object(&self) -> Option<PlistObject> {
        self.object(self.top)
    }

    /// Look up a string-keyed entry in a dictionary.
    fn dict_get(&self, entries: &[(usize, usize)], key: &str) -> Option<PlistObject> {
        self.object(self.dict_value_ref(entries, key)?)
    }

    /// Object index of the value stored under `key`.
    fn dict_value_ref(&self, entries: &[(usize, usize)], key: &str) -> Option<usize> {
        entries
            .iter()
            .find(|(key_ref, _)| self.key_matches(*key_ref, key))
            .map(|(_, value_ref)| *value_ref)
    }

    /// Compare a string object against an ASCII key without decoding it.
    fn key_matches(&self, index: usize, key: &str) -> bool {
        let Some(&offset) = self.offsets.get(index) else {
            return false;
        };
        let Some(&marker) = self.data.get(offset) else {
            return false;
        };
        let Some((len, start)) = self.read_length(offset, marker & 0x0f) else {
            return false;
        };
        if len != key.len() {
            return false;
        }

        match marker >> 4 {
            ASCII_STRING => self.bytes(start, len) == Some(key.as_bytes()),
            UTF16_STRING => self.bytes(start, len * 2).is_some_and(|raw| {
                raw.chunks_exact(2)
                    .zip(key.bytes())
                    .all(|(pair, byte)| pair == [0, byte])
            }),
            _ => false,
        }
    }

    fn bytes(&self, start: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(start..start.checked_add(len)?)
    }

    /// Decode a marker's count, following the `0xF` escape to an integer object.
    fn read_length(&self, offset: usize, low: u8) -> Option<(usize, usize)> {
        if low != 0x0f {
            return Some((low as usize, offset + 1));
        }
        let int_marker = *self.data.get(offset + 1)?;
        if int_marker >> 4 != 0x1 || int_marker & 0x0f > 3 {
            return None;
        }
        let width = 1usize << (int_marker & 0x0f);
        let len = usize::try_from(read_uint(self.bytes(offset + 2, width)?)?).ok()?;
        Some((len, offset + 2 + width))
    }

    fn read_refs(&self, start: usize, count: usize) -> Option<Vec<usize>> {
        let raw = self.bytes(start, count.checked_mul(self.ref_size)?)?;
        raw.chunks_exact(self.ref_size)
            .map(|chunk| usize::try_from(read_uint(chunk)?).ok())
            .collect()
    }
}

fn read_uint(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

/// Extract the best message-text candidate from a keyed archive payload.
///
/// Walks the archive's `$objects` table in order. Plain strings are candidates,
/// as are dictionaries carrying a string under `NS.string` (inline or by UID).
pub fn extract_object_graph(payload: &[u8]) -> Option<String> {
    let plist = BinaryPlist::parse(payload)?;

    let PlistObject::Dict(root) = plist.top_object()? else {
        return None;
    };

    match plist.dict_get(&root, ARCHIVER_KEY) {
        Some(PlistObject::String(archiver)) if archiver == EXPECTED_ARCHIVER => {}
        other => {
            log::debug!("object graph payload rejected: unexpected archiver {:?}", other);
            return None;
        }
    }

    let Some(PlistObject::Array(table)) = plist.dict_get(&root, OBJECTS_KEY) else {
        return None;
    };

    // Table entries may share objects; each dictionary is inspected and each
    // string decoded at most once. A repeated string cannot beat its first
    // occurrence, so skipping it leaves the selection unchanged.
    let mut visited_dicts = HashSet::new();
    let mut decoded_strings = HashSet::new();
    let mut candidates = Vec::new();
    for &object_ref in &table {
        let Some(&offset) = plist.offsets.get(object_ref) else {
            continue;
        };
        let source = match plist.kind(object_ref) {
            Some(ASCII_STRING | UTF16_STRING) => Some(object_ref),
            Some(DICT) if visited_dicts.insert(object_ref) => match plist.object(object_ref) {
                Some(PlistObject::Dict(entries)) => string_payload_ref(&plist, &table, &entries),
                _ => None,
            },
            _ => None,
        };
        let Some(source) = source.filter(|index| decoded_strings.insert(*index)) else {
            continue;
        };

        let raw = match plist.object(source) {
            Some(PlistObject::String(text)) => Some(text),
            _ => None,
        };
        if let Some(text) = raw.as_deref().and_then(accept_candidate) {
            candidates.push(Candidate {
                len: text.len(),
                offset,
                text,
            });
        }
    }

    log::trace!(
        "object graph payload: {} table entries, {} candidates",
        table.len(),
        candidates.len()
    );

    select_longest(candidates).map(|candidate| candidate.text)
}

/// Object index of the string held by an archived string object's `NS.string`
/// property, stored inline or as a UID into `$objects`.
fn string_payload_ref(
    plist: &BinaryPlist<'_>,
    table: &[usize],
    entries: &[(usize, usize)],
) -> Option<usize> {
    let value_ref = plist.dict_value_ref(entries, STRING_PAYLOAD_KEY)?;
    let target = match plist.kind(value_ref)? {
        ASCII_STRING | UTF16_STRING => value_ref,
        UID => match plist.object(value_ref)? {
            PlistObject::Uid(uid) => *table.get(usize::try_from(uid).ok()?)?,
            _ => return None,
        },
        _ => return None,
    };

    matches!(plist.kind(target)?, ASCII_STRING | UTF16_STRING).then_some(target)
}
