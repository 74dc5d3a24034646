use bytes::{BufMut, BytesMut};

const TERMINATOR: &[u8] = b"\r\n";

/// The subset of RESP the story protocol speaks.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue<'data> {
    SimpleString(&'data str),
    SimpleError(&'data str),
    OwnedSimpleError(String),
    Integer(i64),
    Double(f64),
    BulkString(&'data str),
    NullBulkString,
    Array(Vec<RespValue<'data>>),
    NullArray,
}

impl<'data> RespValue<'data> {
    fn tag(&self) -> u8 {
        match self {
            RespValue::SimpleString(_) => b'+',
            RespValue::SimpleError(_) | RespValue::OwnedSimpleError(_) => b'-',
            RespValue::Integer(_) => b':',
            RespValue::Double(_) => b',',
            RespValue::BulkString(_) | RespValue::NullBulkString => b'$',
            RespValue::Array(_) | RespValue::NullArray => b'*',
        }
    }

    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.put_u8(self.tag());
        match self {
            RespValue::SimpleString(s) | RespValue::SimpleError(s) => {
                buf.put(s.as_bytes());
            }
            RespValue::OwnedSimpleError(s) => {
                // Simple strings can't carry line breaks
                buf.put(s.replace(['\r', '\n'], " ").as_bytes());
            }
            RespValue::Integer(n) => {
                buf.put(n.to_string().as_bytes());
            }
            RespValue::Double(f) => {
                buf.put(f.to_string().as_bytes());
            }
            RespValue::BulkString(s) => {
                buf.put(s.len().to_string().as_bytes());
                buf.put(TERMINATOR);
                buf.put(s.as_bytes());
            }
            RespValue::NullBulkString | RespValue::NullArray => {
                buf.put(&b"-1"[..]);
            }
            RespValue::Array(elements) => {
                buf.put(elements.len().to_string().as_bytes());
                buf.put(TERMINATOR);
                for e in elements.iter() {
                    e.serialize(buf);
                }
                // Elements bring their own terminators
                return;
            }
        }
        buf.put(TERMINATOR);
    }

    /// Parse one value from the front of `data`, returning it with whatever
    /// follows it.
    pub fn deserialize(data: &'data [u8]) -> anyhow::Result<(Self, &'data [u8])> {
        let Some(&tag) = data.first() else {
            anyhow::bail!("empty RESP value");
        };

        match tag {
            b'+' => {
                // Simple string: "+OK\r\n"
                let (line, rest) = split_line(data, "simple string")?;
                Ok((RespValue::SimpleString(std::str::from_utf8(line)?), rest))
            }
            b'-' => {
                // Simple error: "-ERR message\r\n"
                let (line, rest) = split_line(data, "simple error")?;
                Ok((RespValue::SimpleError(std::str::from_utf8(line)?), rest))
            }
            b':' => {
                // Integer: ":[<+|->]<value>\r\n"
                let (line, rest) = split_line(data, "integer")?;
                let n = std::str::from_utf8(line)?
                    .parse::<i64>()
                    .map_err(|_| anyhow::format_err!("invalid integer"))?;
                Ok((RespValue::Integer(n), rest))
            }
            b',' => {
                // Double: ",[<+|->]<integral>[.<fractional>][<E|e>[sign]<exponent>]\r\n"
                let (line, rest) = split_line(data, "double")?;
                let f = std::str::from_utf8(line)?
                    .parse::<f64>()
                    .map_err(|_| anyhow::format_err!("invalid double"))?;
                Ok((RespValue::Double(f), rest))
            }
            b'$' => {
                // Bulk string: "$<length>\r\n<data>\r\n"
                let (line, rest) = split_line(data, "bulk string")?;
                let Some(len) = parse_length(line)? else {
                    return Ok((RespValue::NullBulkString, rest));
                };
                let Some(end) = len.checked_add(TERMINATOR.len()) else {
                    anyhow::bail!("invalid length {}", len);
                };
                if rest.len() < end {
                    anyhow::bail!("incomplete bulk string");
                }
                if &rest[len..end] != TERMINATOR {
                    anyhow::bail!("unterminated bulk string");
                }
                let s = std::str::from_utf8(&rest[..len])?;
                Ok((RespValue::BulkString(s), &rest[end..]))
            }
            b'*' => {
                // Array: "*<number-of-elements>\r\n<element-1>...<element-n>"
                let (line, mut rest) = split_line(data, "array")?;
                let Some(num_elements) = parse_length(line)? else {
                    return Ok((RespValue::NullArray, rest));
                };
                let mut elements = Vec::with_capacity(num_elements.min(64));
                for _ in 0..num_elements {
                    let (element, remaining) = RespValue::deserialize(rest)?;
                    elements.push(element);
                    rest = remaining;
                }
                Ok((RespValue::Array(elements), rest))
            }
            tag => Err(anyhow::format_err!("unsupported RESP tag {:?}", tag as char)),
        }
    }
}

/// Split off the line after the tag byte, up to (not including) its terminator.
fn split_line<'data>(
    data: &'data [u8],
    what: &str,
) -> anyhow::Result<(&'data [u8], &'data [u8])> {
    match find_terminator(data) {
        Some(terminator_index) => Ok((
            &data[1..terminator_index],
            &data[terminator_index + TERMINATOR.len()..],
        )),
        None => Err(anyhow::format_err!("unterminated {}", what)),
    }
}

/// A length prefix, where `-1` marks a null value.
fn parse_length(digits: &[u8]) -> anyhow::Result<Option<usize>> {
    match std::str::from_utf8(digits)? {
        "-1" => Ok(None),
        digits => digits
            .parse::<usize>()
            .map(Some)
            .map_err(|_| anyhow::format_err!("invalid length {:?}", digits)),
    }
}

/// Find `Some(index)` of the first occurence of b'\r\n' in the slice,
/// or `None` if the slice doesn't contain a terminator.
fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{find_terminator, RespValue};

    fn serialized(value: &RespValue) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.serialize(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_find_terminator() {
        assert_eq!(find_terminator(b"\r\n"), Some(0));
        assert_eq!(find_terminator(b"foo\r\nbar"), Some(3));
        assert_eq!(find_terminator(b"\r"), None);
        assert_eq!(find_terminator(b"\n"), None);
        assert_eq!(find_terminator(b""), None);
    }

    #[test]
    fn simple_string() {
        let (value, rest) = RespValue::deserialize(b"+OK\r\n").unwrap();
        assert_eq!(value, RespValue::SimpleString("OK"));
        assert!(rest.is_empty());
        assert_eq!(serialized(&value), b"+OK\r\n");

        assert!(RespValue::deserialize(b"+ENDLESS").is_err());
    }

    #[test]
    fn simple_error() {
        let (value, _) = RespValue::deserialize(b"-ERR bad\r\n").unwrap();
        assert_eq!(value, RespValue::SimpleError("ERR bad"));

        let owned = RespValue::OwnedSimpleError("ERR two\r\nlines".to_string());
        assert_eq!(serialized(&owned), b"-ERR two  lines\r\n");
    }

    #[test]
    fn integer() {
        let (value, _) = RespValue::deserialize(b":-123\r\n").unwrap();
        assert_eq!(value, RespValue::Integer(-123));
        assert_eq!(serialized(&value), b":-123\r\n");

        assert!(RespValue::deserialize(b":3.14\r\n").is_err());
        assert!(RespValue::deserialize(b":100000").is_err());
    }

    #[test]
    fn double() {
        let (value, _) = RespValue::deserialize(b",33.3\r\n").unwrap();
        assert_eq!(value, RespValue::Double(33.3));
        assert_eq!(serialized(&RespValue::Double(0.0)), b",0\r\n");
        assert_eq!(serialized(&RespValue::Double(100.0)), b",100\r\n");

        assert!(RespValue::deserialize(b",abc\r\n").is_err());
    }

    #[test]
    fn bulk_string() {
        let (value, rest) = RespValue::deserialize(b"$5\r\nhello\r\n").unwrap();
        assert_eq!(value, RespValue::BulkString("hello"));
        assert!(rest.is_empty());
        assert_eq!(serialized(&value), b"$5\r\nhello\r\n");

        let (value, _) = RespValue::deserialize(b"$0\r\n\r\n").unwrap();
        assert_eq!(value, RespValue::BulkString(""));

        let (value, _) = RespValue::deserialize(b"$-1\r\n").unwrap();
        assert_eq!(value, RespValue::NullBulkString);
        assert_eq!(serialized(&value), b"$-1\r\n");
    }

    #[test]
    fn bulk_string_truncated() {
        assert!(RespValue::deserialize(b"$0").is_err());
        assert!(RespValue::deserialize(b"$10\r\nshort\r\n").is_err());
        assert!(RespValue::deserialize(b"$3\r\nlonger\r\n").is_err());
    }

    #[test]
    fn bulk_string_huge_length() {
        assert!(RespValue::deserialize(b"$18446744073709551615\r\nabc\r\n").is_err());
        assert!(RespValue::deserialize(b"$18446744073709551614\r\nabc\r\n").is_err());
        assert!(RespValue::deserialize(b"$99999999999999999999\r\nabc\r\n").is_err());
    }

    #[test]
    fn array() {
        let data = b"*2\r\n$4\r\nOPEN\r\n$1\r\n0\r\n";
        let (value, rest) = RespValue::deserialize(data).unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::BulkString("OPEN"),
                RespValue::BulkString("0"),
            ])
        );
        assert!(rest.is_empty());
        assert_eq!(serialized(&value), data);

        let (value, _) = RespValue::deserialize(b"*0\r\n").unwrap();
        assert_eq!(value, RespValue::Array(vec![]));

        let (value, _) = RespValue::deserialize(b"*-1\r\n").unwrap();
        assert_eq!(value, RespValue::NullArray);
        assert_eq!(serialized(&value), b"*-1\r\n");

        // Missing elements
        assert!(RespValue::deserialize(b"*2\r\n$4\r\nOPEN\r\n").is_err());
    }

    #[test]
    fn trailing_data_is_returned() {
        let (value, rest) = RespValue::deserialize(b"+PONG\r\n+OK\r\n").unwrap();
        assert_eq!(value, RespValue::SimpleString("PONG"));
        assert_eq!(rest, b"+OK\r\n");
    }

    #[test]
    fn unsupported_tag() {
        assert!(RespValue::deserialize(b"#t\r\n").is_err());
        assert!(RespValue::deserialize(b"").is_err());
    }
}
