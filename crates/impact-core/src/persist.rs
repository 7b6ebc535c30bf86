//! Ordered field stream for per-entity save data.
//!
//! Entities append their fields to a [`Writes`] in a fixed order and read
//! them back from [`Reads`] in the same order. The stream carries no field
//! names; instead each entity record is stored next to a revision byte so a
//! newer build can tell which fields an older save contains.

/// Errors raised while reading a field stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
}

/// Append-only little-endian field writer.
#[derive(Debug, Clone, Default)]
pub struct Writes {
    buf: Vec<u8>,
}

impl Writes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Raw bytes, no length prefix.
    pub fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a field stream produced by [`Writes`].
#[derive(Debug, Clone)]
pub struct Reads<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reads<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], PersistError> {
        let remaining = self.remaining();
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or(PersistError::UnexpectedEof {
                needed: N,
                remaining,
            })?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, PersistError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn f32(&mut self) -> Result<f32, PersistError> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }

    /// The next `len` raw bytes.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], PersistError> {
        let remaining = self.remaining();
        let out = self
            .pos
            .checked_add(len)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or(PersistError::UnexpectedEof {
                needed: len,
                remaining,
            })?;
        self.pos += len;
        Ok(out)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
