use std::time::Duration;

pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(80);
pub const CURSOR_BLINK: Duration = Duration::from_millis(530);
pub const DEFAULT_CURSOR_HIDE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterFrame<'a> {
    pub text: &'a str,
    pub cursor: bool,
    pub typing: bool,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    /// Byte offset of the end of every char, so slicing never splits one.
    boundaries: Vec<usize>,
    char_delay_ms: f64,
    cursor_hide_ms: f64,
    started_ms: f64,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, started_ms: f64) -> Self {
        Self::with_timing(text, started_ms, DEFAULT_CHAR_DELAY, DEFAULT_CURSOR_HIDE)
    }

    pub fn with_timing(
        text: impl Into<String>,
        started_ms: f64,
        char_delay: Duration,
        cursor_hide: Duration,
    ) -> Self {
        let text = text.into();
        let boundaries = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        Self {
            text,
            boundaries,
            char_delay_ms: char_delay.as_secs_f64() * 1000.0,
            cursor_hide_ms: cursor_hide.as_secs_f64() * 1000.0,
            started_ms,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn typed_chars(&self, elapsed: f64) -> usize {
        if self.char_delay_ms <= 0.0 {
            return self.boundaries.len();
        }
        ((elapsed / self.char_delay_ms).floor().max(0.0) as usize).min(self.boundaries.len())
    }

    pub fn typing_duration_ms(&self) -> f64 {
        self.boundaries.len() as f64 * self.char_delay_ms
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        now_ms - self.started_ms >= self.typing_duration_ms() + self.cursor_hide_ms
    }

    pub fn frame(&self, now_ms: f64) -> TypewriterFrame<'_> {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        let typed = self.typed_chars(elapsed);
        let end = typed.checked_sub(1).map_or(0, |i| self.boundaries[i]);

        let blink_ms = CURSOR_BLINK.as_secs_f64() * 1000.0;
        let blink_on = (elapsed / blink_ms).floor() as u64 % 2 == 0;

        TypewriterFrame {
            text: &self.text[..end],
            cursor: blink_on && !self.is_finished(now_ms),
            typing: typed < self.boundaries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveals_one_char_per_delay() {
        let tw = Typewriter::new("Impact", 1000.0);
        assert_eq!(tw.frame(1000.0).text, "");
        assert_eq!(tw.frame(1079.0).text, "");
        assert_eq!(tw.frame(1080.0).text, "I");
        assert_eq!(tw.frame(1200.0).text, "Im");
        let done = tw.frame(1000.0 + 6.0 * 80.0);
        assert_eq!(done.text, "Impact");
        assert!(!done.typing);
        assert!(tw.frame(1100.0).typing);
    }

    #[test]
    fn test_cursor_blinks_then_hides() {
        let tw = Typewriter::new("ab", 0.0);
        assert!(tw.frame(0.0).cursor);
        assert!(!tw.frame(600.0).cursor);
        assert!(tw.frame(1100.0).cursor);

        // typing ends at 160 ms, cursor gone 3000 ms later
        assert!(!tw.is_finished(3159.0));
        assert!(tw.is_finished(3160.0));
        assert!(!tw.frame(3200.0).cursor);
        assert!(!tw.frame(10_000.0).cursor);
    }

    #[test]
    fn test_multibyte_text_never_splits_chars() {
        let tw = Typewriter::new("0→1 ✨", 0.0);
        assert_eq!(tw.frame(80.0).text, "0");
        assert_eq!(tw.frame(160.0).text, "0→");
        assert_eq!(tw.frame(400.0).text, "0→1 ✨");
    }

    #[test]
    fn test_empty_text() {
        let tw = Typewriter::new("", 0.0);
        let frame = tw.frame(50.0);
        assert_eq!(frame.text, "");
        assert!(!frame.typing);
    }
}
