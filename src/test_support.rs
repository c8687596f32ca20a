//! Payload fixture builders for unit and integration tests.
//!
//! These write just enough of each encoding for the readers in
//! [`crate::parser`] to exercise every branch they take.

use crate::parser::streamed::StringPreamble;

#[derive(Clone)]
enum PlistNode {
    Str(String),
    Uid(u64),
    Int(u64),
    Array(Vec<usize>),
    Dict(Vec<(usize, usize)>),
}

/// Minimal binary plist writer: 4-byte offsets, 2-byte object refs.
#[derive(Clone, Default)]
struct PlistWriter {
    nodes: Vec<PlistNode>,
}

impl PlistWriter {
    fn add(&mut self, node: PlistNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn string(&mut self, text: &str) -> usize {
        self.add(PlistNode::Str(text.to_string()))
    }

    fn finish(&self, top: usize) -> Vec<u8> {
        let mut out = b"bplist00".to_vec();
        let mut offsets = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            offsets.push(out.len());
            encode_node(node, &mut out);
        }

        let table_offset = out.len();
        for offset in offsets {
            out.extend_from_slice(&(offset as u32).to_be_bytes());
        }

        out.extend_from_slice(&[0; 6]);
        out.push(4);
        out.push(2);
        out.extend_from_slice(&(self.nodes.len() as u64).to_be_bytes());
        out.extend_from_slice(&(top as u64).to_be_bytes());
        out.extend_from_slice(&(table_offset as u64).to_be_bytes());
        out
    }
}

fn write_marker(out: &mut Vec<u8>, kind: u8, count: usize) {
    if count < 15 {
        out.push((kind << 4) | count as u8);
    } else {
        out.push((kind << 4) | 0x0f);
        out.push(0x12);
        out.extend_from_slice(&(count as u32).to_be_bytes());
    }
}

fn encode_node(node: &PlistNode, out: &mut Vec<u8>) {
    match node {
        PlistNode::Str(text) if text.is_ascii() => {
            write_marker(out, 0x5, text.len());
            out.extend_from_slice(text.as_bytes());
        }
        PlistNode::Str(text) => {
            let units: Vec<u16> = text.encode_utf16().collect();
            write_marker(out, 0x6, units.len());
            for unit in units {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        PlistNode::Uid(value) => {
            out.push(0x83);
            out.extend_from_slice(&(*value as u32).to_be_bytes());
        }
        PlistNode::Int(value) => {
            out.push(0x13);
            out.extend_from_slice(&value.to_be_bytes());
        }
        PlistNode::Array(refs) => {
            write_marker(out, 0xA, refs.len());
            for object_ref in refs {
                out.extend_from_slice(&(*object_ref as u16).to_be_bytes());
            }
        }
        PlistNode::Dict(pairs) => {
            write_marker(out, 0xD, pairs.len());
            for (key, _) in pairs {
                out.extend_from_slice(&(*key as u16).to_be_bytes());
            }
            for (_, value) in pairs {
                out.extend_from_slice(&(*value as u16).to_be_bytes());
            }
        }
    }
}

/// Builds keyed archives shaped like iMessage `attributedBody` blobs.
///
/// The `$objects` table starts with `$null`; every `push_*` call appends
/// entries in order and returns the table index of the last one.
pub struct KeyedArchiveBuilder {
    writer: PlistWriter,
    table: Vec<usize>,
    archiver: String,
}

impl Default for KeyedArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedArchiveBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            writer: PlistWriter::default(),
            table: Vec::new(),
            archiver: "NSKeyedArchiver".to_string(),
        };
        builder.push_string("$null");
        builder
    }

    pub fn with_archiver(mut self, archiver: &str) -> Self {
        self.archiver = archiver.to_string();
        self
    }

    /// Drop the leading `$null` entry, leaving an empty object table.
    pub fn without_null(mut self) -> Self {
        self.table.clear();
        self
    }

    /// Append a bare string to the object table.
    pub fn push_string(&mut self, text: &str) -> u64 {
        let node = self.writer.string(text);
        self.push_node(node)
    }

    /// Append a class description dictionary (`$classname` / `$classes`).
    pub fn push_class(&mut self, name: &str) -> u64 {
        let classname_key = self.writer.string("$classname");
        let classname = self.writer.string(name);
        let classes_key = self.writer.string("$classes");
        let first = self.writer.string(name);
        let root = self.writer.string("NSObject");
        let classes = self.writer.add(PlistNode::Array(vec![first, root]));
        let node = self.writer.add(PlistNode::Dict(vec![
            (classname_key, classname),
            (classes_key, classes),
        ]));
        self.push_node(node)
    }

    /// Append a string plus the string object referencing it via `NS.string`.
    pub fn push_string_object(&mut self, text: &str) -> u64 {
        let string_uid = self.push_string(text);
        let class_uid = self.push_class("NSMutableString");

        let key = self.writer.string("NS.string");
        let value = self.writer.add(PlistNode::Uid(string_uid));
        let class_key = self.writer.string("$class");
        let class_value = self.writer.add(PlistNode::Uid(class_uid));
        let node = self
            .writer
            .add(PlistNode::Dict(vec![(key, value), (class_key, class_value)]));
        self.push_node(node)
    }

    /// Append a string object whose `NS.string` value is stored inline.
    pub fn push_inline_string_object(&mut self, text: &str) -> u64 {
        let key = self.writer.string("NS.string");
        let value = self.writer.string(text);
        let node = self.writer.add(PlistNode::Dict(vec![(key, value)]));
        self.push_node(node)
    }

    /// Append `repeats` table references to one dictionary with `key_count`
    /// entries, each using the same `key` string as key and value.
    pub fn push_shared_dict(&mut self, key: &str, key_count: usize, repeats: usize) -> u64 {
        let key = self.writer.string(key);
        let node = self.writer.add(PlistNode::Dict(vec![(key, key); key_count]));
        for _ in 0..repeats {
            self.table.push(node);
        }
        (self.table.len() - 1) as u64
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = self.writer.clone();
        let objects = writer.add(PlistNode::Array(self.table.clone()));
        let root_key = writer.string("root");
        let root_uid = writer.add(PlistNode::Uid(1));
        let top_dict = writer.add(PlistNode::Dict(vec![(root_key, root_uid)]));

        let version_key = writer.string("$version");
        let version = writer.add(PlistNode::Int(100_000));
        let archiver_key = writer.string("$archiver");
        let archiver = writer.string(&self.archiver);
        let top_key = writer.string("$top");
        let objects_key = writer.string("$objects");

        let top = writer.add(PlistNode::Dict(vec![
            (version_key, version),
            (archiver_key, archiver),
            (top_key, top_dict),
            (objects_key, objects),
        ]));

        writer.finish(top)
    }

    fn push_node(&mut self, node: usize) -> u64 {
        self.table.push(node);
        (self.table.len() - 1) as u64
    }
}

const STREAMED_HEADER: &[u8] = b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01\x40\x84\x84\x84\x12NSAttributedString\x00\x84\x84\x08NSObject\x00\x85\x92";

const STREAMED_SEGMENT_CLASS: &[u8] = b"\x84\x84\x84\x08NSString";

const STREAMED_FOOTER: &[u8] = b"\x86\x84\x02iI\x01\x05\x92\x84\x84\x84\x0cNSDictionary\x00\x94\x84\x01i\x01\x92\x84\x96\x96\x1d__kIMMessagePartAttributeName\x86\x92\x84\x84\x84\x08NSNumber\x00\x84\x84\x07NSValue\x00\x94\x84\x01*\x84\x99\x99\x00\x86\x86\x86";

/// Builds `streamtyped` payloads with one or more string segments.
#[derive(Default)]
pub struct StreamedPayloadBuilder {
    segments: Vec<(StringPreamble, Vec<u8>)>,
}

impl StreamedPayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, text: &str) -> Self {
        self.segment(StringPreamble::Immutable, text.as_bytes())
    }

    pub fn mutable_string(self, text: &str) -> Self {
        self.segment(StringPreamble::Mutable, text.as_bytes())
    }

    /// Append a segment with arbitrary (possibly invalid UTF-8) bytes.
    pub fn segment(mut self, preamble: StringPreamble, bytes: &[u8]) -> Self {
        assert!(bytes.len() <= u16::MAX as usize, "segment too long for fixture");
        self.segments.push((preamble, bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = STREAMED_HEADER.to_vec();
        for (preamble, bytes) in &self.segments {
            out.extend_from_slice(STREAMED_SEGMENT_CLASS);
            out.extend_from_slice(&preamble.bytes());
            if bytes.len() < 0x80 {
                out.push(bytes.len() as u8);
            } else {
                out.push(0x81);
                out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
            }
            out.extend_from_slice(bytes);
        }
        out.extend_from_slice(STREAMED_FOOTER);
        out
    }
}
