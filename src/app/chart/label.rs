pub const ELLIPSIS: &str = "…";

/// Word-wraps `text` into at most `max_lines` lines no wider than `max_width`.
/// When words remain after the last line, or a single word is too wide on its
/// own, the line is cut and ends in an ellipsis.
pub fn wrap_label(
    text: &str,
    max_width: f32,
    max_lines: usize,
    measure: impl Fn(&str) -> f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    if max_lines == 0 {
        return lines;
    }

    let mut current = String::new();
    let mut overflow = false;
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        lines.push(std::mem::replace(&mut current, word.to_owned()));
        if lines.len() == max_lines {
            overflow = true;
            break;
        }
    }
    if !overflow && !current.is_empty() {
        lines.push(current);
    }

    let last = lines.len().saturating_sub(1);
    for (index, line) in lines.iter_mut().enumerate() {
        if (overflow && index == last) || measure(line) > max_width {
            *line = ellipsize(line, max_width, &measure);
        }
    }
    lines
}

fn ellipsize(line: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> String {
    let mut chars = line.chars().collect::<Vec<_>>();
    loop {
        let head = chars.iter().collect::<String>();
        let candidate = format!("{}{ELLIPSIS}", head.trim_end());
        if chars.is_empty() || measure(&candidate) <= max_width {
            return candidate;
        }
        chars.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> f32 {
        text.chars().count() as f32
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_label("Rust async runtime", 10.0, 3, chars),
            vec!["Rust async", "runtime"]
        );
    }

    #[test]
    fn remaining_words_end_in_ellipsis() {
        assert_eq!(
            wrap_label("one two three four five six", 7.0, 2, chars),
            vec!["one two", "three…"]
        );
        assert_eq!(wrap_label("abcdefg hij", 7.0, 1, chars), vec!["abcdef…"]);
    }

    #[test]
    fn overlong_word_is_cut() {
        assert_eq!(
            wrap_label("Supercalifragilistic", 8.0, 2, chars),
            vec!["Superca…"]
        );
    }

    #[test]
    fn empty_input() {
        assert!(wrap_label("   ", 20.0, 3, chars).is_empty());
        assert!(wrap_label("topic", 20.0, 0, chars).is_empty());
    }
}
