//! Decoders for the four git object encodings.

use bytes::Bytes;
use gitdag_types::hash::HASH_LEN;
use gitdag_types::{ObjectHash, ObjectKind};

use crate::error::{NodeError, NodeResult};
use crate::frame::split_header;
use crate::node::{Blob, Commit, EntryMode, GitNode, Tag, Tree, TreeEntry};

/// Parse canonical bytes (`"<kind> <size>\0<payload>"`) into a [`GitNode`].
///
/// Blob data and messages are zero-copy slices of `canonical`.
pub fn parse(canonical: &Bytes) -> NodeResult<GitNode> {
    let (kind, payload) = split_header(canonical)?;
    let payload = canonical.slice(canonical.len() - payload.len()..);
    match kind {
        ObjectKind::Commit => parse_commit(&payload).map(GitNode::Commit),
        ObjectKind::Tree => parse_tree(&payload).map(GitNode::Tree),
        ObjectKind::Blob => Ok(GitNode::Blob(Blob { data: payload })),
        ObjectKind::Tag => parse_tag(&payload).map(GitNode::Tag),
        other => Err(NodeError::UnsupportedKind(other)),
    }
}

fn parse_commit(payload: &Bytes) -> NodeResult<Commit> {
    let kind = ObjectKind::Commit;
    let (headers, message_start) = read_headers(kind, payload)?;

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;
    let mut extra_headers = Vec::new();
    let mut merge_tags = Vec::new();

    for (key, value) in headers {
        match key.as_str() {
            "tree" if tree.is_none() => tree = Some(hash_value(kind, &key, &value)?),
            "tree" => return Err(NodeError::malformed(kind, "duplicate tree header")),
            "parent" => parents.push(hash_value(kind, &key, &value)?),
            "author" if author.is_none() => author = Some(value),
            "committer" if committer.is_none() => committer = Some(value),
            "mergetag" => {
                let embedded = Bytes::from(format!("{value}\n"));
                merge_tags.push(parse_tag(&embedded)?);
                extra_headers.push((key, value));
            }
            _ => extra_headers.push((key, value)),
        }
    }

    Ok(Commit {
        tree: tree.ok_or_else(|| NodeError::malformed(kind, "missing tree header"))?,
        parents,
        author,
        committer,
        extra_headers,
        merge_tags,
        message: payload.slice(message_start..),
    })
}

fn parse_tag(payload: &Bytes) -> NodeResult<Tag> {
    let kind = ObjectKind::Tag;
    let (headers, message_start) = read_headers(kind, payload)?;

    let mut object = None;
    let mut target_kind = None;
    let mut name = None;
    let mut tagger = None;
    let mut extra_headers = Vec::new();

    for (key, value) in headers {
        match key.as_str() {
            "object" if object.is_none() => object = Some(hash_value(kind, &key, &value)?),
            "type" if target_kind.is_none() => {
                let parsed: ObjectKind = value
                    .parse()
                    .map_err(|_| NodeError::malformed(kind, format!("bad type {value:?}")))?;
                if !parsed.is_base() {
                    return Err(NodeError::malformed(kind, format!("bad type {value:?}")));
                }
                target_kind = Some(parsed);
            }
            "tag" if name.is_none() => name = Some(value),
            "tagger" if tagger.is_none() => tagger = Some(value),
            _ => extra_headers.push((key, value)),
        }
    }

    Ok(Tag {
        object: object.ok_or_else(|| NodeError::malformed(kind, "missing object header"))?,
        target_kind: target_kind.ok_or_else(|| NodeError::malformed(kind, "missing type header"))?,
        name: name.unwrap_or_default(),
        tagger,
        extra_headers,
        message: payload.slice(message_start..),
    })
}

fn parse_tree(payload: &[u8]) -> NodeResult<Tree> {
    let kind = ObjectKind::Tree;
    let mut entries = Vec::new();
    let mut rest = payload;

    while !rest.is_empty() {
        let sp = rest
            .iter()
            .position(|b| *b == b' ')
            .ok_or_else(|| NodeError::malformed(kind, "entry without mode"))?;
        let mode = std::str::from_utf8(&rest[..sp])
            .ok()
            .and_then(|s| u32::from_str_radix(s, 8).ok())
            .and_then(EntryMode::from_mode_bits)
            .ok_or_else(|| {
                NodeError::malformed(
                    kind,
                    format!("bad mode {:?}", String::from_utf8_lossy(&rest[..sp])),
                )
            })?;
        rest = &rest[sp + 1..];

        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| NodeError::malformed(kind, "unterminated entry name"))?;
        if nul == 0 {
            return Err(NodeError::malformed(kind, "empty entry name"));
        }
        let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
        rest = &rest[nul + 1..];

        if rest.len() < HASH_LEN {
            return Err(NodeError::malformed(kind, format!("truncated hash for {name:?}")));
        }
        let hash = ObjectHash::from_slice(&rest[..HASH_LEN])?;
        rest = &rest[HASH_LEN..];

        entries.push(TreeEntry { mode, name, hash });
    }

    Ok(Tree { entries })
}

/// Read `key SP value` header lines up to the first blank line.
///
/// Lines starting with a space continue the previous header. Returns the
/// headers and the offset where the message starts.
fn read_headers(kind: ObjectKind, payload: &[u8]) -> NodeResult<(Vec<(String, String)>, usize)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut pos = 0;

    while pos < payload.len() {
        let newline = payload[pos..].iter().position(|b| *b == b'\n').map(|i| pos + i);
        let line_end = newline.unwrap_or(payload.len());
        let line = &payload[pos..line_end];

        if line.is_empty() {
            return Ok((headers, line_end + 1));
        }

        if let Some(continuation) = line.strip_prefix(b" ") {
            let (_, value) = headers
                .last_mut()
                .ok_or_else(|| NodeError::malformed(kind, "continuation before first header"))?;
            value.push('\n');
            value.push_str(&String::from_utf8_lossy(continuation));
        } else {
            let (key, value) = match line.iter().position(|b| *b == b' ') {
                Some(sp) => (&line[..sp], &line[sp + 1..]),
                None => (line, &line[line.len()..]),
            };
            headers.push((
                String::from_utf8_lossy(key).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            ));
        }

        pos = line_end + 1;
    }

    Ok((headers, payload.len()))
}

fn hash_value(kind: ObjectKind, key: &str, value: &str) -> NodeResult<ObjectHash> {
    ObjectHash::from_hex(value).map_err(|e| NodeError::malformed(kind, format!("{key}: {e}")))
}
