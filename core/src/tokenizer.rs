use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref NON_TERM: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex");
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into index terms: lowercase, strip everything outside `[a-z0-9]`,
/// split on whitespace and drop stopwords. Total over any input.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_TERM.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// Tokens of `text` joined by single spaces; feeding the result back into
/// [`tokenize`] yields the same sequence.
pub fn tokenize_join(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Split text into sentences after `.`, `!` or `?` followed by whitespace.
/// The terminator stays with its sentence; blank pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // the punctuation is a single ASCII byte
        let end = m.start() + 1;
        push_trimmed(&mut out, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut out, &text[start..]);
    out
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let s = piece.trim();
    if !s.is_empty() { out.push(s.to_string()); }
}
