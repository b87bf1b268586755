//! Lexer for the search box syntax
//!
//! Recognizes bare words, `"quoted phrases"`, the `OR`/`AND` keywords, a
//! leading `-` for exclusion and `field:` prefixes.

use crate::error::{Result, VanceError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An unquoted word
    Word(String),
    /// A double-quoted phrase
    Quoted(String),
    And,
    Or,
    /// Leading minus (excluded clause)
    Minus,
    /// Colon separator (field:word)
    Colon,
    Eof,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        match self.current_char() {
            ':' => {
                self.advance();
                Ok(Token::Colon)
            }
            '-' => {
                self.advance();
                Ok(Token::Minus)
            }
            '"' => {
                self.advance();
                self.read_quoted_string()
            }
            _ => Ok(self.read_word()),
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_whitespace() || ch == '"' || ch == ':' {
                break;
            }
            word.push(ch);
            self.advance();
        }

        // Keywords are case-sensitive so "or" stays a searchable word
        match word.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            _ => Token::Word(word),
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let mut s = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            self.advance();
            if ch == '"' {
                return Ok(Token::Quoted(s));
            }
            s.push(ch);
        }

        Err(VanceError::QueryParse("unterminated quoted string".to_string()))
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_words_and_keywords() {
        assert_eq!(
            lex("rust OR go and"),
            vec![
                Token::Word("rust".to_string()),
                Token::Or,
                Token::Word("go".to_string()),
                Token::Word("and".to_string()),
            ]
        );
    }

    #[test]
    fn test_field_and_exclusion() {
        assert_eq!(
            lex("name:design -draft"),
            vec![
                Token::Word("name".to_string()),
                Token::Colon,
                Token::Word("design".to_string()),
                Token::Minus,
                Token::Word("draft".to_string()),
            ]
        );
    }

    #[test]
    fn test_inner_hyphen_stays_in_word() {
        assert_eq!(lex("design-notes"), vec![Token::Word("design-notes".to_string())]);
    }

    #[test]
    fn test_quoted_phrase() {
        assert_eq!(
            lex("\"hello world\" x"),
            vec![
                Token::Quoted("hello world".to_string()),
                Token::Word("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(Lexer::new("\"hello").tokenize().is_err());
    }
}
