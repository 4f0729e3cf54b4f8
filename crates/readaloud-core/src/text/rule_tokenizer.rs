//! Built-in rule-based tokenizer.
//!
//! Used when the synthesis backend does not ship its own tokenizer, and by
//! tests. Words (letters, digits, inner apostrophes, decimal points) are one
//! token each; every punctuation mark or symbol is its own token, except
//! that a run of dots is a single token.

use crate::ports::{SpeechTokenizer, Token, TokenId};

pub const DOT: TokenId = 1;
pub const EXCLAMATION: TokenId = 2;
pub const QUESTION: TokenId = 3;
pub const ELLIPSIS: TokenId = 4;

const SYMBOL_BASE: TokenId = 0x1000;
const WORD_BASE: TokenId = 0x8000_0000;

/// Splits text into words and punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTokenizer;

impl RuleTokenizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// FNV-1a over the lowercased word.
fn word_id(word: &str) -> TokenId {
    let mut hash: u32 = 0x811c_9dc5;
    for c in word.chars().flat_map(char::to_lowercase) {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
    }
    WORD_BASE | (hash & 0x7FFF_FFFF)
}

impl SpeechTokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let end_of = |i: usize| chars.get(i).map_or(text.len(), |(pos, _)| *pos);
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let (start, c) = chars[i];

            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if is_word_char(c) {
                let mut j = i + 1;
                while j < chars.len() {
                    let (_, cur) = chars[j];
                    let prev = chars[j - 1].1;
                    let next = chars.get(j + 1).map(|(_, n)| *n);
                    let joins = match cur {
                        '\'' | '’' => next.is_some_and(is_word_char),
                        '.' | ',' => {
                            prev.is_ascii_digit() && next.is_some_and(|n| n.is_ascii_digit())
                        }
                        other => is_word_char(other),
                    };
                    if !joins {
                        break;
                    }
                    j += 1;
                }
                let span = start..end_of(j);
                tokens.push(Token {
                    id: word_id(&text[span.clone()]),
                    span,
                });
                i = j;
                continue;
            }

            let (id, next) = match c {
                '.' => {
                    let mut j = i + 1;
                    while j < chars.len() && chars[j].1 == '.' {
                        j += 1;
                    }
                    (if j - i > 1 { ELLIPSIS } else { DOT }, j)
                }
                '…' => (ELLIPSIS, i + 1),
                '!' => (EXCLAMATION, i + 1),
                '?' => (QUESTION, i + 1),
                other => (SYMBOL_BASE + u32::from(other), i + 1),
            };
            tokens.push(Token {
                id,
                span: start..end_of(next),
            });
            i = next;
        }

        tokens
    }
}
