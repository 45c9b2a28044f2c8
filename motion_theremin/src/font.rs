//! Tiny 3×5 bitmap font for the overlay.
//!
//! A glyph is 15 bits, five rows of three, top row in the high bits.

pub const GLYPH_W: usize = 3;
pub const GLYPH_H: usize = 5;
/// Horizontal advance per character, in font pixels.
pub const ADVANCE: usize = GLYPH_W + 1;

pub fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_011_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '-' => 0b000_000_111_000_000,
        '+' => 0b000_010_111_010_000,
        '=' => 0b000_111_000_111_000,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '/' => 0b001_001_010_100_100,
        '%' => 0b101_001_010_100_101,
        '(' => 0b010_100_100_100_010,
        ')' => 0b010_001_001_001_010,
        '<' => 0b001_010_100_010_001,
        '>' => 0b100_010_001_010_100,
        '[' => 0b110_100_100_100_110,
        ']' => 0b011_001_001_001_011,
        ' ' => 0,
        _   => 0b000_000_010_000_000,
    }
}

/// Whether font pixel `(col, row)` of `c` is lit.
pub fn lit(c: char, col: usize, row: usize) -> bool {
    if col >= GLYPH_W || row >= GLYPH_H {
        return false;
    }
    let bit = (GLYPH_H - 1 - row) * GLYPH_W + (GLYPH_W - 1 - col);
    glyph(c) & (1 << bit) != 0
}

/// Width in font pixels of `text` (no trailing gap).
pub fn text_width(text: &str) -> usize {
    (text.chars().count() * ADVANCE).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_has_a_serif_base() {
        // bottom row of '1' is fully lit, top row only the middle
        assert!((0..3).all(|c| lit('1', c, 4)));
        assert_eq!((0..3).map(|c| lit('1', c, 0)).collect::<Vec<_>>(), vec![false, true, false]);
    }

    #[test]
    fn lowercase_shares_uppercase() {
        assert_eq!(glyph('q'), glyph('Q'));
    }

    #[test]
    fn out_of_cell_is_dark() {
        assert!(!lit('8', 3, 0));
        assert!(!lit('8', 0, 5));
    }

    #[test]
    fn width_of_text() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("ab"), 7);
    }
}
