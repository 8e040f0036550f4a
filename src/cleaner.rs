//! Post-processing of raw model output into a final task description.

use once_cell::sync::Lazy;
use regex::Regex;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block regex"));

/// Label the prompt ends with; models often echo it before the answer.
static DESCRIPTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"任务描述[:：]").expect("valid marker regex"));

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"));

const QUOTES: [char; 3] = ['"', '“', '”'];

/// Reduce raw model output to the final description.
///
/// Reasoning blocks are dropped, the text after the last `任务描述:` label is
/// preferred, otherwise the last paragraph is kept. Surrounding quotes and
/// whitespace are trimmed. Cleaning is idempotent.
pub fn clean_model_output(raw: &str) -> String {
    let text = strip_reasoning(raw);

    let answer = match text_after_marker(&text) {
        Some(answer) => answer,
        None => last_paragraph(&text),
    };

    answer
        .trim_matches(|c: char| c.is_whitespace() || QUOTES.contains(&c))
        .to_string()
}

/// Remove `<think>` regions, including ones left open or opened before the
/// visible text started.
fn strip_reasoning(raw: &str) -> String {
    let mut text = THINK_BLOCK.replace_all(raw, "").into_owned();

    // A closing tag without an opener: everything before it was reasoning.
    if let Some(pos) = text.rfind(THINK_CLOSE) {
        text.drain(..pos + THINK_CLOSE.len());
    }
    // An opener that never closed: the rest is unfinished reasoning.
    if let Some(pos) = text.find(THINK_OPEN) {
        text.truncate(pos);
    }

    text
}

/// The first non-empty line following the last marker that has one.
fn text_after_marker(text: &str) -> Option<&str> {
    let markers: Vec<_> = DESCRIPTION_MARKER.find_iter(text).collect();

    markers.into_iter().rev().find_map(|marker| {
        text[marker.end()..]
            .trim_start()
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    })
}

fn last_paragraph(text: &str) -> &str {
    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "整理本周工作成果，总结问题并规划下周重点。",
        "<think>用户想要一个周报描述</think>\n\n整理本周工作成果",
        "<think>先想一想\n再想一想</think>任务描述：\"梳理本周进展\"",
        "reasoning without opener</think>\n最终描述",
        "开始描述<think>unfinished reasoning",
        "intro\n\n\nfinal answer",
        "“完成季度报告”",
        "\"\"double quoted\"\"",
        "任务描述：任务描述：嵌套标签",
        "任务描述：\n\n  下一行的描述  ",
        "a 任务描述：”",
        "line one\nline two\n\n  \n last paragraph \r\n",
    ];

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = clean_model_output(sample);
            let twice = clean_model_output(&once);
            assert_eq!(once, twice, "cleaning {sample:?} is not idempotent");
        }
    }

    #[test]
    fn test_removes_reasoning_regions() {
        let cases = [
            ("<think>secret plan</think>answer", "answer"),
            ("<think>a</think>mid<think>b</think>end", "midend"),
            ("secret plan</think>answer", "answer"),
            ("answer<think>secret plan", "answer"),
            ("<think>secret plan", ""),
        ];
        for (raw, expected) in cases {
            let cleaned = clean_model_output(raw);
            assert_eq!(cleaned, expected);
            assert!(!cleaned.contains("secret"));
            assert!(!cleaned.contains("think>"));
        }
    }

    #[test]
    fn test_marker_extraction() {
        assert_eq!(clean_model_output("任务描述：\"Hello world\""), "Hello world");
        assert_eq!(clean_model_output("任务标题：写周报\n任务描述: “Hello world”"), "Hello world");
        assert_eq!(clean_model_output("任务描述：\n汇总本周工作"), "汇总本周工作");
        assert_eq!(clean_model_output("任务描述：任务描述：嵌套标签"), "嵌套标签");
    }

    #[test]
    fn test_falls_back_to_last_paragraph() {
        assert_eq!(clean_model_output("intro\n\nfinal answer"), "final answer");
        assert_eq!(clean_model_output("intro\n  \nfinal answer\n\n"), "final answer");
        // Lines inside one paragraph stay together.
        assert_eq!(clean_model_output("first\nsecond"), "first\nsecond");
    }

    #[test]
    fn test_strips_surrounding_quotes_and_whitespace() {
        assert_eq!(clean_model_output("  \"完成季度报告\"  "), "完成季度报告");
        assert_eq!(clean_model_output("“完成季度报告”"), "完成季度报告");
        assert_eq!(clean_model_output("说明“重点”事项"), "说明“重点”事项");
    }
}
