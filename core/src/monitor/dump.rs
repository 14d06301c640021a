//! Hex dump rendering for the `m` command.

use std::fmt::Write;

use crate::core::memory::AddressSpace;

use super::encoding::Encoding;

const ROW: u32 = 16;

/// Render `from..=to` as 16-byte rows aligned on 16. Columns of a row that
/// fall outside the range are left blank so the first and last rows come
/// out jagged instead of shifted.
///
/// ```text
/// $0010              00 00 00 00  00 00 00 00 00 00 00 00      ............
/// ```
pub fn dump(mem: &mut AddressSpace, from: u32, to: u32, encoding: &Encoding) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = from & !(ROW - 1);
    loop {
        let mut line = format!("${row:04x} ");
        let mut text = String::with_capacity(ROW as usize);
        for col in 0..ROW {
            if col == ROW / 2 {
                line.push(' ');
            }
            let addr = row + col;
            if addr < from || addr > to {
                line.push_str("   ");
                text.push(' ');
            } else {
                let value = mem.read(addr);
                let _ = write!(line, " {value:02x}");
                text.push(encoding.char_for(value));
            }
        }
        line.push_str("  ");
        line.push_str(&text);
        rows.push(line);

        row = row.saturating_add(ROW);
        if row > to || row == u32::MAX {
            break;
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::encoding::ASCII;

    fn zeroed() -> AddressSpace {
        let mut mem = AddressSpace::new(0x100);
        mem.map_ram(0, vec![0; 0x100]);
        mem
    }

    fn trimmed(rows: Vec<String>) -> Vec<String> {
        rows.into_iter().map(|r| r.trim_end().to_string()).collect()
    }

    #[test]
    fn test_full_rows() {
        let mut mem = zeroed();
        let rows = dump(&mut mem, 0x10, 0x2f, &ASCII);
        assert_eq!(
            rows,
            [
                "$0010  00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................",
                "$0020  00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................",
            ]
        );
    }

    #[test]
    fn test_jagged_top() {
        let mut mem = zeroed();
        let rows = trimmed(dump(&mut mem, 0x14, 0x2f, &ASCII));
        assert_eq!(
            rows,
            [
                "$0010              00 00 00 00  00 00 00 00 00 00 00 00      ............",
                "$0020  00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................",
            ]
        );
    }

    #[test]
    fn test_jagged_bottom() {
        let mut mem = zeroed();
        let rows = trimmed(dump(&mut mem, 0x10, 0x2b, &ASCII));
        assert_eq!(
            rows,
            [
                "$0010  00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................",
                "$0020  00 00 00 00 00 00 00 00  00 00 00 00              ............",
            ]
        );
    }

    #[test]
    fn test_single_value() {
        let mut mem = zeroed();
        mem.write(0x11, 0x41);
        let rows = trimmed(dump(&mut mem, 0x11, 0x11, &ASCII));
        let want = format!("$0010     41{}A", " ".repeat(46));
        assert_eq!(rows, [want]);
    }

    #[test]
    fn test_text_column() {
        let mut mem = zeroed();
        for (i, v) in (0x40..0x60).enumerate() {
            mem.write(0x10 + i as u32, v);
        }
        let rows = dump(&mut mem, 0x10, 0x2f, &ASCII);
        assert_eq!(
            rows,
            [
                "$0010  40 41 42 43 44 45 46 47  48 49 4a 4b 4c 4d 4e 4f  @ABCDEFGHIJKLMNO",
                "$0020  50 51 52 53 54 55 56 57  58 59 5a 5b 5c 5d 5e 5f  PQRSTUVWXYZ[\\]^_",
            ]
        );
    }
}
