//! SubRip (SRT) 字幕解析

use std::sync::OnceLock;

use regex::Regex;

use super::vtt::{parse_timestamp, strip_cue_markup};
use crate::subtitle::SubtitleCue;

fn timing_regex() -> &'static Regex {
    static TIMING: OnceLock<Regex> = OnceLock::new();
    TIMING.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{1,3})\s*-->\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{1,3})")
            .unwrap_or_else(|_| Regex::new(r"").unwrap())
    })
}

/// 解析一行 SRT 时间行
pub fn parse_srt_timing(line: &str) -> Option<(f64, f64)> {
    let caps = timing_regex().captures(line)?;
    let start = parse_timestamp(caps.get(1)?.as_str())?;
    let end = parse_timestamp(caps.get(2)?.as_str())?;
    (start <= end).then_some((start, end))
}

/// 解析 SRT 内容
///
/// 以空行分块，每块依次为序号、时间行和若干文本行。缺少序号的块也能接受，
/// 无法解析的块直接跳过。
pub fn parse_srt(content: &str) -> Vec<SubtitleCue> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in content.split("\n\n") {
        let lines: Vec<&str> = block
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            continue;
        }

        let timing_index = if lines[0].contains("-->") { 0 } else { 1 };
        let Some(timing_line) = lines.get(timing_index) else {
            continue;
        };
        let Some((start_time, end_time)) = parse_srt_timing(timing_line) else {
            tracing::debug!("跳过无法解析的 SRT 块: {}", lines[0]);
            continue;
        };

        let text = lines[timing_index + 1..]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        let text = strip_cue_markup(&text).trim().to_string();
        if text.is_empty() {
            continue;
        }

        cues.push(SubtitleCue {
            start_time,
            end_time,
            text,
        });
    }

    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_blocks() {
        let cues = parse_srt(
            "1\n00:00:01,000 --> 00:00:02,500\nHello\nworld\n\n2\n00:00:03,000 --> 00:00:04,000\n<i>Bye</i>\n",
        );
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_time, 1.0);
        assert_eq!(cues[0].end_time, 2.5);
        assert_eq!(cues[0].text, "Hello\nworld");
        assert_eq!(cues[1].text, "Bye");
    }

    #[test]
    fn tolerates_crlf_and_missing_index() {
        let cues = parse_srt("00:01:00,000 --> 00:01:01,000\r\nNo index\r\n\r\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_time, 60.0);
    }

    #[test]
    fn skips_malformed_blocks() {
        let cues = parse_srt(
            "1\nnot a timing line\nLost\n\n2\n00:00:05,000 --> 00:00:04,000\nBackwards\n\n3\n00:00:06,000 --> 00:00:07,000\nKept\n",
        );
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Kept");
    }
}
