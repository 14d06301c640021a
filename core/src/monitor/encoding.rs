//! Byte-to-text encodings for the memory dump's text column.

/// A named byte decoder. Bytes with no printable form decode to `None`
/// and are shown as `.`.
#[derive(Clone, Copy)]
pub struct Encoding {
    pub name: &'static str,
    pub decode: fn(u8) -> Option<char>,
}

impl Encoding {
    pub const fn new(name: &'static str, decode: fn(u8) -> Option<char>) -> Self {
        Self { name, decode }
    }

    pub fn char_for(&self, value: u8) -> char {
        (self.decode)(value).unwrap_or('.')
    }
}

impl std::fmt::Debug for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Encoding").field(&self.name).finish()
    }
}

fn ascii(value: u8) -> Option<char> {
    (0x20..=0x7e).contains(&value).then_some(value as char)
}

/// Screen-code style alphabet: 1..=26 are `A`..=`Z`.
fn az26(value: u8) -> Option<char> {
    (1..=26).contains(&value).then(|| (b'A' + value - 1) as char)
}

pub const ASCII: Encoding = Encoding::new("ascii", ascii);
pub const AZ26: Encoding = Encoding::new("az26", az26);

pub fn builtin() -> [Encoding; 2] {
    [ASCII, AZ26]
}
