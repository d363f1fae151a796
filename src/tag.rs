//! Struct tag parsing.
//!
//! A raw tag holds space-separated `key:"value"` pairs, one per tag
//! namespace. The value registered under the configured namespace is split
//! on `,`: the first segment is the output name (empty means "use the field
//! name") and the rest are options such as `omitempty`.

use crate::inspect::FieldDescriptor;
use std::collections::BTreeSet;

/// Option that drops a field holding its type's zero value.
pub const OMIT_EMPTY: &str = "omitempty";

/// Tag name that drops a field unconditionally.
pub const SKIP: &str = "-";

/// Parsed tag for one field under one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    pub options: TagOptions,
}

impl TagSpec {
    /// Output key for `field`: the tag name when present, else the field name.
    pub fn key<'a>(&'a self, field: &FieldDescriptor) -> &'a str {
        if self.name.is_empty() {
            field.name
        } else {
            &self.name
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.name == SKIP
    }
}

/// Options following the name, kept verbatim with set semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions(BTreeSet<String>);

impl TagOptions {
    pub fn has(&self, option: &str) -> bool {
        self.0.contains(option)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for TagOptions {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        TagOptions(iter.into_iter().map(str::to_owned).collect())
    }
}

/// Parse the tag of `field` registered under `tag_name`.
pub fn parse(field: &FieldDescriptor, tag_name: &str) -> TagSpec {
    split(&lookup(field.tag, tag_name).unwrap_or_default())
}

/// Split a tag value into its name and options.
pub fn split(value: &str) -> TagSpec {
    let mut parts = value.split(',');
    let name = parts.next().unwrap_or_default().to_string();
    TagSpec {
        name,
        options: parts.collect(),
    }
}

/// Find the value stored under `key` in a raw struct tag.
///
/// Returns `None` when the key is absent. Parsing stops at the first
/// malformed pair, so keys after it are not found either.
///
/// Values are double-quoted with Go string escapes: `\a \b \f \n \r \t
/// \v \\ \"`, `\xHH`, three-digit octal `\OOO`, `\uHHHH` and
/// `\UHHHHHHHH`. Byte escapes must still form valid UTF-8. Any other escape,
/// `\'` included, makes the value unreadable and yields `None`.
pub fn lookup(raw: &str, key: &str) -> Option<String> {
    let mut tag = raw.as_bytes();
    while !tag.is_empty() {
        let start = tag.iter().position(|&b| b != b' ').unwrap_or(tag.len());
        tag = &tag[start..];
        if tag.is_empty() {
            break;
        }

        let name_len = tag
            .iter()
            .position(|&b| b <= b' ' || b == b':' || b == b'"' || b == 0x7f)
            .unwrap_or(tag.len());
        if name_len == 0 || name_len + 1 >= tag.len() || tag[name_len] != b':' || tag[name_len + 1] != b'"' {
            break;
        }
        let name = &tag[..name_len];
        tag = &tag[name_len + 1..];

        // `tag` now starts at the opening quote.
        let mut i = 1;
        while i < tag.len() && tag[i] != b'"' {
            if tag[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= tag.len() {
            break;
        }
        let quoted = &tag[..=i];
        tag = &tag[i + 1..];

        if name == key.as_bytes() {
            return std::str::from_utf8(quoted).ok().and_then(unquote);
        }
    }
    None
}

fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('\n') {
        return None;
    }
    let mut out = Vec::with_capacity(inner.len());
    let mut rest = inner.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let (&c, tail) = rest.split_first()?;
        rest = tail;
        match c {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' | b'"' => out.push(c),
            b'x' => {
                let value = digits(take(&mut rest, 2)?, 16)?;
                out.push(value as u8);
            }
            b'0'..=b'7' => {
                let value = digits(&[&[c][..], take(&mut rest, 2)?].concat(), 8)?;
                out.push(u8::try_from(value).ok()?);
            }
            b'u' | b'U' => {
                let len = if c == b'u' { 4 } else { 8 };
                let ch = char::from_u32(digits(take(&mut rest, len)?, 16)?)?;
                out.extend_from_slice(ch.encode_utf8(&mut [0; 4]).as_bytes());
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

fn take<'a>(rest: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if rest.len() < n {
        return None;
    }
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    Some(head)
}

fn digits(bytes: &[u8], radix: u32) -> Option<u32> {
    bytes
        .iter()
        .try_fold(0u32, |acc, &b| Some(acc * radix + char::from(b).to_digit(radix)?))
}
