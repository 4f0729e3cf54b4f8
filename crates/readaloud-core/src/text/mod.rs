//! Incremental text chunking.

mod chunker;
mod rule_tokenizer;

pub use chunker::TextChunker;
pub use rule_tokenizer::RuleTokenizer;
