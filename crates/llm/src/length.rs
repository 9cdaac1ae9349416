const NORMAL_SENTENCE_CAP: usize = 5;
const DATA_DRIVEN_SENTENCE_CAP: usize = 6;

/// Post-generation length limiting (§4.10): split into sentences, cap at
/// five normally or six for "data-driven" output (one containing a numeric
/// token), and when truncating a data-driven output whose true final
/// sentence carries numbers, keep that sentence rather than dropping it.
pub fn limit_length(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return text.trim().to_string();
    }

    let data_driven = contains_digit(text);
    let cap = if data_driven { DATA_DRIVEN_SENTENCE_CAP } else { NORMAL_SENTENCE_CAP };

    if sentences.len() <= cap {
        return sentences.join(" ");
    }

    let mut kept: Vec<&str> = sentences[..cap].iter().map(String::as_str).collect();

    if data_driven {
        let last = sentences.last().expect("non-empty sentences");
        if contains_digit(last) && kept.last() != Some(&last.as_str()) {
            kept.pop();
            kept.push(last.as_str());
        }
    }

    kept.join(" ")
}

fn contains_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Splits on `.`/`!`/`?` followed by whitespace or end-of-string, treating a
/// punctuation mark flanked by digits (e.g. "3.5") as part of the number
/// rather than a sentence boundary.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for i in 0..chars.len() {
        let c = chars[i];
        current.push(c);

        if c == '.' || c == '!' || c == '?' {
            let decimal = i > 0 && i + 1 < chars.len() && chars[i - 1].is_ascii_digit() && chars[i + 1].is_ascii_digit();
            let boundary = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
            if !decimal && boundary {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                current.clear();
            }
        }
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        sentences.push(trailing.to_string());
    }

    sentences
}
