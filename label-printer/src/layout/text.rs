//! Fixed-pitch fonts, word wrapping and font/line-count search

use serde::Serialize;

use crate::units::DOTS_PER_MM;

/// Vertical space between two lines of the same block
pub const LINE_SPACING_MM: f64 = 0.5;

const EPSILON: f64 = 1e-9;

/// Built-in bitmap fonts of the printer
///
/// Every glyph of a font has the same advance, so measuring text is
/// `chars × width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Font {
    F1 = 1,
    F2 = 2,
    F3 = 3,
    F4 = 4,
}

impl Font {
    pub const ALL: [Font; 4] = [Font::F1, Font::F2, Font::F3, Font::F4];
    pub const LARGEST: Font = Font::F4;

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn width_dots(self) -> u32 {
        match self {
            Font::F1 => 8,
            Font::F2 => 12,
            Font::F3 => 16,
            Font::F4 => 24,
        }
    }

    pub fn height_dots(self) -> u32 {
        match self {
            Font::F1 => 12,
            Font::F2 => 20,
            Font::F3 => 24,
            Font::F4 => 32,
        }
    }

    pub fn width_mm(self) -> f64 {
        self.width_dots() as f64 / DOTS_PER_MM
    }

    pub fn height_mm(self) -> f64 {
        self.height_dots() as f64 / DOTS_PER_MM
    }

    /// `self` and every smaller font, largest first
    pub fn descending(self) -> impl Iterator<Item = Font> {
        Font::ALL.into_iter().rev().filter(move |f| *f <= self)
    }
}

/// How many characters of `font` fit in `max_width_mm`
pub fn chars_per_line(max_width_mm: f64, font: Font) -> usize {
    if !max_width_mm.is_finite() || max_width_mm <= 0.0 {
        return 0;
    }
    (max_width_mm * DOTS_PER_MM / font.width_dots() as f64 + EPSILON).floor() as usize
}

/// Height of a block of `lines` lines set in `font`
pub fn block_height_mm(font: Font, lines: usize) -> f64 {
    if lines == 0 {
        return 0.0;
    }
    lines as f64 * font.height_mm() + (lines - 1) as f64 * LINE_SPACING_MM
}

/// Greedy word wrap under a fixed per-line character budget
///
/// Words longer than a line are hard-split, after the last hyphen that
/// fits when there is one. Once `max_lines` lines are filled the rest of
/// the text is dropped without error: this is the known truncation point
/// of the layout engine, and callers that need the full text must check
/// the result (see [`is_lossless`]).
pub fn wrap(text: &str, max_width_mm: f64, font: Font, max_lines: usize) -> Vec<String> {
    let budget = chars_per_line(max_width_mm, font);
    let mut lines: Vec<String> = Vec::new();
    if budget == 0 || max_lines == 0 {
        return lines;
    }

    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
            if lines.len() == max_lines {
                return lines;
            }
        }

        let mut rest: Vec<char> = word.chars().collect();
        while rest.len() > budget {
            let cut = split_point(&rest, budget);
            lines.push(rest[..cut].iter().collect());
            if lines.len() == max_lines {
                return lines;
            }
            rest.drain(..cut);
        }
        current_len = rest.len();
        current = rest.into_iter().collect();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Break right after the last hyphen inside the budget, else at the budget
fn split_point(chars: &[char], budget: usize) -> usize {
    chars[..budget]
        .iter()
        .rposition(|&c| c == '-')
        .map(|i| i + 1)
        .unwrap_or(budget)
}

fn content_chars(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

/// True when `lines` carry every non-whitespace character of `text`
///
/// Spaces that collapse into a line break are not content.
pub fn is_lossless(text: &str, lines: &[String]) -> bool {
    let placed: usize = lines.iter().map(|l| content_chars(l)).sum();
    placed >= content_chars(text)
}

/// A block of wrapped text and the font it is set in
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font: Font,
    pub lines: Vec<String>,
    /// False when the text had to be cut to stay inside the area
    pub fits: bool,
}

impl TextLayout {
    pub fn empty() -> Self {
        Self {
            font: Font::F1,
            lines: Vec::new(),
            fits: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn height_mm(&self) -> f64 {
        block_height_mm(self.font, self.lines.len())
    }

    pub fn line_width_mm(&self, line: &str) -> f64 {
        line.chars().count() as f64 * self.font.width_mm()
    }

    /// Vertical distance from one line's top to the next
    pub fn line_pitch_mm(&self) -> f64 {
        self.font.height_mm() + LINE_SPACING_MM
    }
}

/// Pick the line count and font for `text` in a `width_mm` wide column
///
/// Fewer lines win over a bigger font; among equal line counts the biggest
/// font that loses nothing wins. When nothing fits, the font-1 wrap at
/// `max_lines` is returned with `fits = false`.
pub fn find_optimal_layout(
    text: &str,
    width_mm: f64,
    max_lines: usize,
    max_font: Font,
) -> TextLayout {
    find_optimal_layout_within(text, width_mm, f64::INFINITY, max_lines, max_font)
}

/// [`find_optimal_layout`] restricted to blocks no taller than `height_mm`
pub fn find_optimal_layout_within(
    text: &str,
    width_mm: f64,
    height_mm: f64,
    max_lines: usize,
    max_font: Font,
) -> TextLayout {
    if text.trim().is_empty() || max_lines == 0 {
        return TextLayout::empty();
    }

    for line_count in 1..=max_lines {
        for font in max_font.descending() {
            if block_height_mm(font, line_count) > height_mm + EPSILON {
                continue;
            }
            let lines = wrap(text, width_mm, font, line_count);
            if !lines.is_empty() && is_lossless(text, &lines) {
                return TextLayout {
                    font,
                    lines,
                    fits: true,
                };
            }
        }
    }

    // Degraded path: smallest font, as many lines as the area allows
    let line_cap = (1..=max_lines)
        .rev()
        .find(|&n| block_height_mm(Font::F1, n) <= height_mm + EPSILON)
        .unwrap_or(0);
    TextLayout {
        font: Font::F1,
        lines: wrap(text, width_mm, Font::F1, line_cap),
        fits: false,
    }
}

/// Cut `text` to a single line of `font` without wrapping
pub fn truncate_line(text: &str, width_mm: f64, font: Font) -> String {
    let budget = chars_per_line(width_mm, font);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(budget).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width_for(chars: usize, font: Font) -> f64 {
        chars as f64 * font.width_mm()
    }

    #[test]
    fn test_chars_per_line() {
        // 10 mm = 80 dots
        assert_eq!(chars_per_line(10.0, Font::F1), 10);
        assert_eq!(chars_per_line(10.0, Font::F2), 6);
        assert_eq!(chars_per_line(10.0, Font::F3), 5);
        assert_eq!(chars_per_line(10.0, Font::F4), 3);
        assert_eq!(chars_per_line(0.0, Font::F1), 0);
        assert_eq!(chars_per_line(-3.0, Font::F1), 0);
    }

    #[test]
    fn test_wrap_greedy() {
        let lines = wrap("aa bb cc dd", width_for(5, Font::F1), Font::F1, 5);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn test_wrap_hard_split_prefers_hyphen() {
        let lines = wrap("ABC-DEFGHIJ", width_for(6, Font::F1), Font::F1, 5);
        assert_eq!(lines, vec!["ABC-", "DEFGHI", "J"]);

        let lines = wrap("ABCDEFGHIJ", width_for(4, Font::F1), Font::F1, 5);
        assert_eq!(lines, vec!["ABCD", "EFGH", "IJ"]);
    }

    #[test]
    fn test_wrap_drops_overflow_silently() {
        let text = "one two three four five";
        let lines = wrap(text, width_for(5, Font::F1), Font::F1, 2);
        assert_eq!(lines, vec!["one", "two"]);
        assert!(!is_lossless(text, &lines));
    }

    #[test]
    fn test_wrap_lines_respect_budget() {
        let texts = [
            "PRODUCT-ABC-123 Batch 2026-01-15",
            "a-very-long-hyphenated-identifier-that-never-ends",
            "x",
            "  spaced   out    words  ",
            "Ünïcödé wörds änd mörë",
        ];
        for text in texts {
            for font in Font::ALL {
                for width in [3.0, 7.5, 12.0, 25.0, 48.0] {
                    let budget = chars_per_line(width, font);
                    for line in wrap(text, width, font, 4) {
                        assert!(
                            line.chars().count() <= budget,
                            "{:?} exceeds {} chars ({:?}, {} mm)",
                            line,
                            budget,
                            font,
                            width
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_wrap_zero_budget() {
        assert!(wrap("abc", 0.5, Font::F4, 3).is_empty());
    }

    #[test]
    fn test_optimal_prefers_fewer_lines_over_bigger_font() {
        // 12 chars at F1 = 12 mm; "HELLO WORLD" is 11 chars
        let width = 12.0;
        let layout = find_optimal_layout("HELLO WORLD", width, 3, Font::F4);
        assert!(layout.fits);
        assert_eq!(layout.lines.len(), 1);
        // F2 fits 8 chars, F1 fits 12: one line needs F1
        assert_eq!(layout.font, Font::F1);
    }

    #[test]
    fn test_optimal_picks_largest_font_for_line_count() {
        let layout = find_optimal_layout("ABC", 48.0, 2, Font::F4);
        assert_eq!(layout.font, Font::F4);
        assert_eq!(layout.lines, vec!["ABC"]);
    }

    #[test]
    fn test_optimal_never_exceeds_max_lines() {
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        for max_lines in 1..=4 {
            let layout = find_optimal_layout(text, 10.0, max_lines, Font::F4);
            assert!(layout.lines.len() <= max_lines);
        }
    }

    #[test]
    fn test_optimal_lossy_fallback() {
        let text = "this text is far too long for a tiny box";
        let layout = find_optimal_layout(text, 5.0, 2, Font::F3);
        assert!(!layout.fits);
        assert_eq!(layout.font, Font::F1);
        assert_eq!(layout.lines.len(), 2);
    }

    #[test]
    fn test_optimal_within_height() {
        // F4 block is 4 mm tall; a 3.5 mm area forces a smaller font
        let layout = find_optimal_layout_within("ABC", 48.0, 3.5, 1, Font::F4);
        assert!(layout.fits);
        assert_eq!(layout.font, Font::F3);
        assert!(layout.height_mm() <= 3.5);
    }

    #[test]
    fn test_optimal_within_no_room() {
        let layout = find_optimal_layout_within("ABC", 48.0, 1.0, 2, Font::F4);
        assert!(layout.is_empty());
        assert!(!layout.fits);
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("Batch: 2026-01-15", width_for(6, Font::F2), Font::F2), "Batch:");
        assert_eq!(truncate_line("ok", 20.0, Font::F2), "ok");
    }

    #[test]
    fn test_font_descending() {
        let fonts: Vec<_> = Font::F3.descending().collect();
        assert_eq!(fonts, vec![Font::F3, Font::F2, Font::F1]);
    }
}
