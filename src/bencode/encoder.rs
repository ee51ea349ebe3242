/// Types that can be written in bencode wire format
pub trait BencodeEncode {
    fn bencode(&self, buf: &mut Vec<u8>);
}

macro_rules! bencode_integer {
    ($($ty:ty),*) => {
        $(
            impl BencodeEncode for $ty {
                fn bencode(&self, buf: &mut Vec<u8>) {
                    let mut buffer = itoa::Buffer::new();
                    buf.push(b'i');
                    buf.extend_from_slice(buffer.format(*self).as_bytes());
                    buf.push(b'e');
                }
            }
        )*
    };
}

bencode_integer!(i64, u64, u32, u16);

impl BencodeEncode for [u8] {
    fn bencode(&self, buf: &mut Vec<u8>) {
        let mut buffer = itoa::Buffer::new();
        buf.extend_from_slice(buffer.format(self.len()).as_bytes());
        buf.push(b':');
        buf.extend_from_slice(self);
    }
}

impl BencodeEncode for str {
    fn bencode(&self, buf: &mut Vec<u8>) {
        self.as_bytes().bencode(buf);
    }
}

impl<T: BencodeEncode + ?Sized> BencodeEncode for &T {
    fn bencode(&self, buf: &mut Vec<u8>) {
        (**self).bencode(buf);
    }
}

impl BencodeEncode for String {
    fn bencode(&self, buf: &mut Vec<u8>) {
        self.as_str().bencode(buf);
    }
}

impl BencodeEncode for Vec<u8> {
    fn bencode(&self, buf: &mut Vec<u8>) {
        self.as_slice().bencode(buf);
    }
}

/// Length-prefixed byte string header, for payloads written piecewise
pub fn encode_bytes_header(len: usize, buf: &mut Vec<u8>) {
    let mut buffer = itoa::Buffer::new();
    buf.extend_from_slice(buffer.format(len).as_bytes());
    buf.push(b':');
}

/// Writes a dictionary entry by entry.
///
/// Bencode requires keys in lexicographic byte order; callers add them sorted.
pub struct DictWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> DictWriter<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        buf.push(b'd');
        Self { buf }
    }

    pub fn entry<V: BencodeEncode + ?Sized>(&mut self, key: &str, value: &V) -> &mut Self {
        key.bencode(self.buf);
        value.bencode(self.buf);
        self
    }

    /// Write the key and hand the raw buffer to `f` for the value
    pub fn entry_with(&mut self, key: &str, f: impl FnOnce(&mut Vec<u8>)) -> &mut Self {
        key.bencode(self.buf);
        f(self.buf);
        self
    }

    pub fn finish(self) {
        self.buf.push(b'e');
    }
}

pub fn encode_list<T: BencodeEncode>(items: &[T], buf: &mut Vec<u8>) {
    buf.push(b'l');
    for item in items {
        item.bencode(buf);
    }
    buf.push(b'e');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        let mut buf = Vec::new();
        42i64.bencode(&mut buf);
        assert_eq!(buf, b"i42e");

        let mut buf = Vec::new();
        (-42i64).bencode(&mut buf);
        assert_eq!(buf, b"i-42e");

        let mut buf = Vec::new();
        0u32.bencode(&mut buf);
        assert_eq!(buf, b"i0e");
    }

    #[test]
    fn test_encode_bytes() {
        let mut buf = Vec::new();
        b"hello".as_slice().bencode(&mut buf);
        assert_eq!(buf, b"5:hello");

        let mut buf = Vec::new();
        b"".as_slice().bencode(&mut buf);
        assert_eq!(buf, b"0:");

        let mut buf = Vec::new();
        vec![1u8, 2, 3, 4].bencode(&mut buf);
        assert_eq!(buf, b"4:\x01\x02\x03\x04");
    }

    #[test]
    fn test_encode_string() {
        let mut buf = Vec::new();
        "spam".bencode(&mut buf);
        assert_eq!(buf, b"4:spam");
    }

    #[test]
    fn test_encode_list() {
        let mut buf = Vec::new();
        encode_list(&[1i64, 2i64, 3i64], &mut buf);
        assert_eq!(buf, b"li1ei2ei3ee");
    }

    #[test]
    fn test_dict_writer() {
        let mut buf = Vec::new();
        let mut dict = DictWriter::new(&mut buf);
        dict.entry("bar", &100u32).entry("foo", "spam");
        dict.finish();
        assert_eq!(buf, b"d3:bari100e3:foo4:spame");
    }

    #[test]
    fn test_dict_writer_nested() {
        let mut buf = Vec::new();
        let mut outer = DictWriter::new(&mut buf);
        outer.entry_with("files", |b| {
            let mut inner = DictWriter::new(b);
            inner.entry("n", &1u32);
            inner.finish();
        });
        outer.finish();
        assert_eq!(buf, b"d5:filesd1:ni1eee");
    }
}
