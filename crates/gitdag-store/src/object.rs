use gitdag_types::ObjectKind;

/// A source object as read from the git object database.
///
/// `data` is the object's payload without the `"<kind> <size>\0"` header;
/// `size` is the length git recorded for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload size recorded by the object database.
    pub size: u64,
    /// The raw payload.
    pub data: Vec<u8>,
}

impl EncodedObject {
    /// Create an encoded object whose size is the payload length.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, size, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_payload_length() {
        let obj = EncodedObject::new(ObjectKind::Blob, b"hello".to_vec());
        assert_eq!(obj.size, 5);
        assert_eq!(obj.kind, ObjectKind::Blob);
    }
}
