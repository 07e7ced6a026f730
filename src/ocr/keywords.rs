//! Keyword extraction from recognized text

/// Separator placed between parsed blocks (pages) of one image
pub const BLOCK_SEPARATOR: &str = "\n---\n";

/// Join the parsed blocks of one image into a single text
pub fn join_blocks<S: AsRef<str>>(blocks: &[S]) -> String {
    blocks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || c == '\u{feff}'
        || matches!(c, ',' | '。' | '、' | '!' | '！' | '?' | '？')
}

/// Split text into keyword tokens on whitespace, commas and Japanese/ASCII
/// sentence punctuation. Never yields empty tokens.
pub fn split_keywords(text: &str) -> Vec<String> {
    text.split(is_delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ascii() {
        assert_eq!(split_keywords("HELLO WORLD"), vec!["HELLO", "WORLD"]);
        assert_eq!(
            split_keywords("  apples,oranges\t\tpears!? "),
            vec!["apples", "oranges", "pears"]
        );
    }

    #[test]
    fn test_split_japanese_punctuation() {
        assert_eq!(
            split_keywords("東京、大阪。名古屋！札幌？福岡"),
            vec!["東京", "大阪", "名古屋", "札幌", "福岡"]
        );
        // Ideographic space
        assert_eq!(split_keywords("日本\u{3000}語"), vec!["日本", "語"]);
    }

    #[test]
    fn test_no_empty_tokens() {
        assert!(split_keywords("").is_empty());
        assert!(split_keywords(" ,、。!！?？\n\r\t").is_empty());
    }

    #[test]
    fn test_idempotent_on_single_token() {
        for token in split_keywords("alpha beta、ガンマ") {
            assert_eq!(split_keywords(&token), vec![token.clone()]);
        }
    }

    #[test]
    fn test_block_separator_splits_into_its_own_token() {
        let text = join_blocks(&["page one", "page two"]);
        assert_eq!(text, "page one\n---\npage two");
        assert_eq!(split_keywords(&text), vec!["page", "one", "---", "page", "two"]);
    }

    #[test]
    fn test_join_blocks_recovers_blocks() {
        let blocks = vec!["first page\nline 2", "", "third"];
        let joined = join_blocks(&blocks);
        let recovered: Vec<&str> = joined.split(BLOCK_SEPARATOR).collect();
        assert_eq!(recovered, blocks);

        assert_eq!(join_blocks::<&str>(&[]), "");
        assert_eq!(join_blocks(&["only"]), "only");
    }
}
