use bytes::{BufMut, Bytes, BytesMut};
use gitdag_types::ObjectKind;

use crate::error::{NodeError, NodeResult};
use crate::node::GitNode;
use crate::parse::parse;

/// Canonical bytes of a node together with their parsed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translated {
    /// `"<kind> <size>\0"` followed by the raw payload.
    pub canonical: Bytes,
    /// The decoded node.
    pub node: GitNode,
}

/// Frame a raw payload with git's object header.
///
/// `size` is the payload length recorded by the source store; it is written
/// verbatim. Delta kinds have no standalone encoding and are rejected.
pub fn frame(kind: ObjectKind, size: u64, raw: &[u8]) -> NodeResult<Bytes> {
    if !kind.is_base() {
        return Err(NodeError::UnsupportedKind(kind));
    }
    let header = format!("{kind} {size}\0");
    let mut buf = BytesMut::with_capacity(header.len() + raw.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(raw);
    Ok(buf.freeze())
}

/// Frame and parse in one step.
pub fn translate(kind: ObjectKind, size: u64, raw: &[u8]) -> NodeResult<Translated> {
    let canonical = frame(kind, size, raw)?;
    let node = parse(&canonical)?;
    Ok(Translated { canonical, node })
}

/// Split canonical bytes into their kind and payload.
///
/// The header size must equal the payload length.
pub fn split_header(canonical: &[u8]) -> NodeResult<(ObjectKind, &[u8])> {
    let nul = canonical
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| NodeError::MalformedHeader("missing NUL terminator".into()))?;
    let header = std::str::from_utf8(&canonical[..nul])
        .map_err(|_| NodeError::MalformedHeader("header is not utf-8".into()))?;
    let (kind, size) = header
        .split_once(' ')
        .ok_or_else(|| NodeError::MalformedHeader(format!("{header:?}: missing size")))?;
    let kind: ObjectKind = kind
        .parse()
        .map_err(|_| NodeError::MalformedHeader(format!("{header:?}: unknown kind")))?;
    if !kind.is_base() {
        return Err(NodeError::UnsupportedKind(kind));
    }
    let declared: u64 = size
        .parse()
        .map_err(|_| NodeError::MalformedHeader(format!("{header:?}: bad size")))?;

    let payload = &canonical[nul + 1..];
    let actual = payload.len() as u64;
    if declared != actual {
        return Err(NodeError::SizeMismatch { declared, actual });
    }
    Ok((kind, payload))
}
