//! 文本清洗: 去除链接/话题/提及，去除停用词

use crate::types::TextRecord;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+").expect("valid url pattern"));
static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid hashtag pattern"));
static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("valid mention pattern"));
static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}]+)*").expect("valid word pattern"));

/// NLTK 英文停用词表
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ]
    .into_iter()
    .collect()
});

/// 去除链接、#话题 与 @提及
pub fn strip_symbols(content: &str) -> String {
    let text = URL_REGEX.replace_all(content, "");
    let text = HASHTAG_REGEX.replace_all(&text, "");
    MENTION_REGEX.replace_all(&text, "").into_owned()
}

/// 切分为单词，标点不计入
pub fn tokenize(content: &str) -> Vec<&str> {
    WORD_REGEX.find_iter(content).map(|m| m.as_str()).collect()
}

pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase().replace('’', "'");
    STOP_WORDS.contains(lower.as_str())
}

/// 去除停用词并以单个空格重新拼接
pub fn remove_stopwords(content: &str) -> String {
    tokenize(content)
        .into_iter()
        .filter(|word| !is_stop_word(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 第一阶段: 清除符号，内容为空或全是空白的记录被丢弃
pub fn cleanse_symbols(records: Vec<TextRecord>) -> Vec<TextRecord> {
    let total = records.len();
    let cleaned: Vec<TextRecord> = records
        .into_iter()
        .filter_map(|record| {
            let content = strip_symbols(&record.content);
            if content.trim().is_empty() {
                return None;
            }
            Some(TextRecord { content, ..record })
        })
        .collect();

    tracing::debug!("Symbol cleansing kept {} of {} records", cleaned.len(), total);
    cleaned
}

/// 第二阶段: 去除停用词，从不丢弃记录（结果可以为空）
pub fn cleanse_stopwords(records: Vec<TextRecord>) -> Vec<TextRecord> {
    records
        .into_iter()
        .map(|record| TextRecord {
            content: remove_stopwords(&record.content),
            ..record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(content: &str) -> TextRecord {
        let date = NaiveDate::from_ymd_opt(2016, 1, 12).unwrap();
        TextRecord {
            timestamp: date.and_hms_opt(14, 30, 0).unwrap(),
            date,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_strip_symbols() {
        let cleaned = strip_symbols("great day! http://x.co #stocks @trader");

        assert_eq!(cleaned.trim(), "great day!");
        assert!(!cleaned.contains("http"));
        assert!(!cleaned.contains('#'));
        assert!(!cleaned.contains('@'));
        assert!(!cleaned.contains("stocks"));
        assert!(!cleaned.contains("trader"));
    }

    #[test]
    fn test_cleanse_symbols_drops_empty_records() {
        let records = vec![
            record("Markets rally https://t.co/abc"),
            record("https://t.co/abc #SPY @someone"),
            record("   "),
            record(""),
            record("Oil slides again"),
        ];

        let cleaned = cleanse_symbols(records);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].content.trim(), "Markets rally");
        assert_eq!(cleaned[1].content, "Oil slides again");
    }

    #[test]
    fn test_remove_stopwords() {
        assert_eq!(
            remove_stopwords("The market is not doing great, but it's up!"),
            "market great"
        );
        assert_eq!(remove_stopwords("Stocks don't fall"), "Stocks fall");
        assert_eq!(remove_stopwords("Stocks don’t fall"), "Stocks fall");
    }

    #[test]
    fn test_cleanse_stopwords_keeps_empty_rows() {
        let records = vec![record("this is it"), record("bullish earnings")];
        let cleaned = cleanse_stopwords(records);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].content, "");
        assert_eq!(cleaned[1].content, "bullish earnings");
    }

    #[test]
    fn test_tokenize_ignores_punctuation() {
        assert_eq!(tokenize("Up 3%... wow!!"), vec!["Up", "3", "wow"]);
    }
}
