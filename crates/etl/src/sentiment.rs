//! 情感分析模块

use crate::cleansing::tokenize;
use crate::types::{SentimentRecord, TextRecord};
use std::collections::{HashMap, HashSet};

/// 单条文本的极性与主观性
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl SentimentScore {
    pub const NONE: Self = Self {
        polarity: 0.0,
        subjectivity: 0.0,
    };
}

/// 基于词典的情感分析器
///
/// 每个命中词典的词贡献 (极性, 主观性)，前一个词为程度副词时两者乘以强度，
/// 为否定词时极性乘以 -0.5。文本得分为所有命中词的均值。
pub struct SentimentAnalyzer {
    lexicon: HashMap<String, (f64, f64)>,
    intensifiers: HashMap<String, f64>,
    negations: HashSet<String>,
}

const NEGATION_FACTOR: f64 = -0.5;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        let mut analyzer = Self {
            lexicon: HashMap::new(),
            intensifiers: HashMap::new(),
            negations: HashSet::new(),
        };

        analyzer.initialize_dictionaries();
        analyzer
    }

    fn initialize_dictionaries(&mut self) {
        // (词, 极性, 主观性)
        let lexicon = [
            // 正面
            ("bullish", 0.6, 0.8),
            ("bull", 0.4, 0.6),
            ("surge", 0.5, 0.6),
            ("surges", 0.5, 0.6),
            ("soar", 0.6, 0.7),
            ("soars", 0.6, 0.7),
            ("rally", 0.4, 0.5),
            ("rallies", 0.4, 0.5),
            ("gain", 0.3, 0.4),
            ("gains", 0.3, 0.4),
            ("rise", 0.2, 0.3),
            ("rises", 0.2, 0.3),
            ("profit", 0.3, 0.4),
            ("profitable", 0.5, 0.5),
            ("growth", 0.3, 0.4),
            ("strong", 0.43, 0.73),
            ("stronger", 0.43, 0.73),
            ("positive", 0.23, 0.55),
            ("good", 0.7, 0.6),
            ("better", 0.5, 0.5),
            ("best", 1.0, 0.3),
            ("great", 0.8, 0.75),
            ("excellent", 1.0, 1.0),
            ("amazing", 0.6, 0.9),
            ("awesome", 1.0, 1.0),
            ("nice", 0.6, 1.0),
            ("happy", 0.8, 1.0),
            ("optimistic", 0.5, 0.8),
            ("confident", 0.5, 0.83),
            ("breakthrough", 0.5, 0.6),
            ("innovation", 0.3, 0.5),
            ("record", 0.2, 0.3),
            ("high", 0.16, 0.54),
            ("higher", 0.25, 0.5),
            ("upgrade", 0.4, 0.4),
            ("success", 0.3, 0.3),
            ("successful", 0.75, 0.95),
            ("outperform", 0.4, 0.5),
            ("beat", 0.3, 0.4),
            ("boom", 0.5, 0.6),
            ("recovery", 0.3, 0.4),
            ("safe", 0.5, 0.5),
            ("easy", 0.43, 0.83),
            ("important", 0.4, 1.0),
            ("interesting", 0.5, 0.5),
            ("true", 0.35, 0.65),
            ("new", 0.14, 0.45),
            ("big", 0.0, 0.1),
            ("huge", 0.4, 0.9),
            // 负面
            ("bearish", -0.6, 0.8),
            ("bear", -0.4, 0.6),
            ("crash", -0.7, 0.8),
            ("crashes", -0.7, 0.8),
            ("plunge", -0.6, 0.7),
            ("plunges", -0.6, 0.7),
            ("drop", -0.3, 0.4),
            ("drops", -0.3, 0.4),
            ("fall", -0.3, 0.4),
            ("falls", -0.3, 0.4),
            ("slide", -0.3, 0.4),
            ("slides", -0.3, 0.4),
            ("loss", -0.4, 0.4),
            ("losses", -0.4, 0.4),
            ("negative", -0.3, 0.4),
            ("bad", -0.7, 0.67),
            ("worse", -0.4, 0.6),
            ("worst", -1.0, 1.0),
            ("terrible", -1.0, 1.0),
            ("awful", -1.0, 1.0),
            ("poor", -0.4, 0.6),
            ("weak", -0.38, 0.63),
            ("weaker", -0.38, 0.63),
            ("scam", -0.8, 0.9),
            ("fraud", -0.8, 0.8),
            ("risk", -0.2, 0.4),
            ("risky", -0.5, 0.7),
            ("decline", -0.3, 0.4),
            ("declines", -0.3, 0.4),
            ("dump", -0.5, 0.6),
            ("low", 0.0, 0.3),
            ("lower", 0.0, 0.3),
            ("concern", -0.2, 0.5),
            ("concerns", -0.2, 0.5),
            ("warning", -0.3, 0.5),
            ("crisis", -0.6, 0.6),
            ("panic", -0.6, 0.8),
            ("fear", -0.5, 0.7),
            ("fears", -0.5, 0.7),
            ("uncertain", -0.2, 0.5),
            ("uncertainty", -0.2, 0.5),
            ("volatile", -0.2, 0.6),
            ("underperform", -0.4, 0.5),
            ("recession", -0.5, 0.5),
            ("sad", -0.5, 1.0),
            ("wrong", -0.5, 0.9),
            ("difficult", -0.5, 1.0),
            ("hard", -0.29, 0.54),
            ("angry", -0.5, 1.0),
            ("worried", -0.5, 0.8),
            ("cheap", 0.4, 0.7),
            ("expensive", -0.5, 0.7),
        ];

        for (word, polarity, subjectivity) in lexicon {
            self.lexicon.insert(word.to_string(), (polarity, subjectivity));
        }

        let intensifiers = [
            ("very", 1.3),
            ("really", 1.3),
            ("extremely", 1.5),
            ("incredibly", 1.5),
            ("highly", 1.3),
            ("super", 1.3),
            ("most", 1.2),
            ("pretty", 1.1),
            ("somewhat", 0.7),
            ("slightly", 0.5),
        ];
        for (word, intensity) in intensifiers {
            self.intensifiers.insert(word.to_string(), intensity);
        }

        for word in ["not", "never", "no", "nor", "neither", "without"] {
            self.negations.insert(word.to_string());
        }
    }

    fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word) || word.ends_with("n't") || word.ends_with("n’t")
    }

    /// 分析一段文本
    pub fn analyze(&self, content: &str) -> SentimentScore {
        let words: Vec<String> = tokenize(content).iter().map(|w| w.to_lowercase()).collect();

        let mut contributions = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let Some(&(mut polarity, mut subjectivity)) = self.lexicon.get(word.as_str()) else {
                continue;
            };

            let mut back = i;
            if back > 0 {
                if let Some(&intensity) = self.intensifiers.get(words[back - 1].as_str()) {
                    polarity *= intensity;
                    subjectivity *= intensity;
                    back -= 1;
                }
            }
            if back > 0 && self.is_negation(&words[back - 1]) {
                polarity *= NEGATION_FACTOR;
            }

            contributions.push((polarity, subjectivity));
        }

        if contributions.is_empty() {
            return SentimentScore::NONE;
        }

        let n = contributions.len() as f64;
        let polarity = contributions.iter().map(|c| c.0).sum::<f64>() / n;
        let subjectivity = contributions.iter().map(|c| c.1).sum::<f64>() / n;

        SentimentScore {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }

    /// 第三阶段: 为每条记录打分
    pub fn score(&self, records: &[TextRecord]) -> Vec<SentimentRecord> {
        records
            .iter()
            .map(|record| {
                let score = self.analyze(&record.content);
                SentimentRecord {
                    date: record.date,
                    polarity: score.polarity,
                    subjectivity: score.subjectivity,
                }
            })
            .collect()
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_positive_sentiment() {
        let analyzer = SentimentAnalyzer::new();
        let result = analyzer.analyze("Stocks rally to record high on strong earnings");

        println!("Polarity: {}", result.polarity);
        println!("Subjectivity: {}", result.subjectivity);

        assert!(result.polarity > 0.0, "Should be positive");
        assert!((0.0..=1.0).contains(&result.subjectivity));
    }

    #[test]
    fn test_negative_sentiment() {
        let analyzer = SentimentAnalyzer::new();
        let result =
            analyzer.analyze("Market panic as oil prices plunge, investors fear recession");

        assert!(result.polarity < 0.0, "Should be negative");
    }

    #[test]
    fn test_no_lexicon_words() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.analyze("Fed meeting Wednesday"), SentimentScore::NONE);
        assert_eq!(analyzer.analyze(""), SentimentScore::NONE);
    }

    #[test]
    fn test_modifiers() {
        let analyzer = SentimentAnalyzer::new();

        let plain = analyzer.analyze("good");
        assert!((plain.polarity - 0.7).abs() < 1e-12);
        assert!((plain.subjectivity - 0.6).abs() < 1e-12);

        let very = analyzer.analyze("very good");
        assert!((very.polarity - 0.91).abs() < 1e-12);
        assert!((very.subjectivity - 0.78).abs() < 1e-12);

        let negated = analyzer.analyze("not good");
        assert!((negated.polarity + 0.35).abs() < 1e-12);

        let negated_intensified = analyzer.analyze("isn't very good");
        assert!((negated_intensified.polarity + 0.455).abs() < 1e-12);

        let clamped = analyzer.analyze("extremely excellent");
        assert_eq!(clamped.polarity, 1.0);
        assert_eq!(clamped.subjectivity, 1.0);
    }

    #[test]
    fn test_score_is_deterministic_and_keeps_dates() {
        let analyzer = SentimentAnalyzer::new();
        let date = NaiveDate::from_ymd_opt(2016, 2, 3).unwrap();
        let records = vec![
            TextRecord {
                timestamp: date.and_hms_opt(9, 0, 0).unwrap(),
                date,
                content: "great quarter".to_string(),
            },
            TextRecord {
                timestamp: date.and_hms_opt(10, 0, 0).unwrap(),
                date,
                content: String::new(),
            },
        ];

        let first = analyzer.score(&records);
        let second = analyzer.score(&records);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].date, date);
        assert!((first[0].polarity - 0.8).abs() < 1e-12);
        assert_eq!(first[1].polarity, 0.0);
        assert_eq!(first[1].subjectivity, 0.0);
    }
}
