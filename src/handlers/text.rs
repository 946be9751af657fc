#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub upper: String,
    pub lower: String,
}

pub fn analyze(text: &str) -> TextStats {
    TextStats {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        upper: text.to_uppercase(),
        lower: text.to_lowercase(),
    }
}

impl TextStats {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Words: {}, Characters: {}", self.words, self.characters),
            self.upper.clone(),
            self.lower.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world() {
        let stats = analyze("Hello world");
        assert_eq!(stats.words, 2);
        assert_eq!(stats.characters, 11);
        assert_eq!(stats.upper, "HELLO WORLD");
        assert_eq!(stats.lower, "hello world");
        assert_eq!(stats.lines()[0], "Words: 2, Characters: 11");
    }

    #[test]
    fn runs_of_whitespace_are_one_separator() {
        let stats = analyze("  one \t two\n\nthree  ");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.characters, 20);
    }

    #[test]
    fn characters_are_not_bytes() {
        let stats = analyze("café");
        assert_eq!(stats.characters, 4);
        assert_eq!(stats.upper, "CAFÉ");
    }

    #[test]
    fn empty_input() {
        let stats = analyze("");
        assert_eq!((stats.words, stats.characters), (0, 0));
    }
}
