//! WebVTT 字幕解析与生成

use std::sync::OnceLock;

use regex::Regex;

use crate::subtitle::SubtitleCue;

/// 文件头标记
pub const VTT_HEADER: &str = "WEBVTT";

const TIMING_ARROW: &str = "-->";

fn cue_tag_regex() -> &'static Regex {
    static CUE_TAG: OnceLock<Regex> = OnceLock::new();
    CUE_TAG.get_or_init(|| {
        Regex::new(r"<[^>\n]*>").unwrap_or_else(|_| Regex::new(r"").unwrap())
    })
}

fn blank_lines_regex() -> &'static Regex {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();
    BLANK_LINES.get_or_init(|| Regex::new(r"\n\s*\n").unwrap_or_else(|_| Regex::new(r"").unwrap()))
}

/// 字幕正文中的空行会结束当前字幕，`-->` 会被当作时间行
fn sanitize_cue_text(text: &str) -> String {
    let text = text.trim_matches(['\n', '\r']).replace(TIMING_ARROW, "->");
    blank_lines_regex().replace_all(&text, "\n").into_owned()
}

/// 解析时间戳：`HH:MM:SS.mmm` 或 `MM:SS.mmm`，毫秒分隔符也接受逗号
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (clock, millis) = match raw.rfind(['.', ',']) {
        Some(index) => (&raw[..index], &raw[index + 1..]),
        None => (raw, "0"),
    };

    if millis.is_empty() || millis.len() > 3 || !millis.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // "5" 表示 500 毫秒
    let millis: u32 = format!("{:0<3}", millis).parse().ok()?;

    let parts: Vec<&str> = clock.split(':').collect();
    let numbers: Option<Vec<u32>> = parts
        .iter()
        .map(|part| {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                part.parse().ok()
            }
        })
        .collect();
    let numbers = numbers?;

    let (hours, minutes, seconds) = match numbers.as_slice() {
        [minutes, seconds] => (0, *minutes, *seconds),
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        _ => return None,
    };

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

/// 解析 `start --> end [settings]` 时间行
pub fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once(TIMING_ARROW)?;
    let end = rest.split_whitespace().next()?;
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    (start <= end).then_some((start, end))
}

/// 去掉 `<v Name>`、`<c.class>`、`<00:01.000>` 等内联标记并还原常见实体
pub fn strip_cue_markup(text: &str) -> String {
    cue_tag_regex()
        .replace_all(text, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// 解析 WebVTT 内容
///
/// 格式错误的块会被跳过，返回其余可用的字幕。
pub fn parse_vtt(content: &str) -> Vec<SubtitleCue> {
    let content = content.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = content.lines().collect();
    let mut cues = Vec::new();

    if !lines
        .first()
        .is_some_and(|line| line.trim_start().starts_with(VTT_HEADER))
    {
        tracing::debug!("字幕内容缺少 WEBVTT 文件头，按宽松模式解析");
    }

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        index += 1;

        if !line.contains(TIMING_ARROW) {
            continue;
        }

        let mut text_lines = Vec::new();
        while index < lines.len() {
            let next = lines[index];
            if next.trim().is_empty() || next.contains(TIMING_ARROW) {
                break;
            }
            text_lines.push(next.trim_end());
            index += 1;
        }

        let Some((start_time, end_time)) = parse_timing_line(line) else {
            tracing::debug!("跳过无法解析的时间行: {}", line);
            continue;
        };

        let text = strip_cue_markup(&text_lines.join("\n")).trim().to_string();
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

/// 格式化时间：小时为零时省略为 `MM:SS.mmm`
pub fn format_vtt_time(seconds: f64) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, millis)
    }
}

/// 生成 WebVTT 内容
pub fn serialize_vtt(cues: &[SubtitleCue]) -> String {
    let mut out = String::from(VTT_HEADER);
    out.push_str("\n\n");
    for (index, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} {} {}\n{}\n\n",
            index + 1,
            format_vtt_time(cue.start_time),
            TIMING_ARROW,
            format_vtt_time(cue.end_time),
            sanitize_cue_text(&cue.text)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_cue() {
        let cues = parse_vtt("WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.500\nHello\n\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_time, 0.0);
        assert_eq!(cues[0].end_time, 2.5);
        assert_eq!(cues[0].text, "Hello");
    }

    #[test]
    fn short_timestamps_settings_and_multiline_text() {
        let cues = parse_vtt(
            "WEBVTT\n\n01:02.250 --> 01:04.000 align:start position:10%\nLine one\nLine two\n01:05.000 --> 01:06.000\nNext\n",
        );
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_time, 62.25);
        assert_eq!(cues[0].text, "Line one\nLine two");
        assert_eq!(cues[1].text, "Next");
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let cues = parse_vtt(
            "WEBVTT\n\nxx:00.000 --> 00:01.000\nBroken\n\n00:05.000 --> 00:04.000\nBackwards\n\n00:06.000 --> 00:07.000\nGood\n",
        );
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Good");
    }

    #[test]
    fn markup_is_stripped() {
        let cues = parse_vtt(
            "WEBVTT\n\n00:00.000 --> 00:01.000\n<v Roger>Hi &amp; <c.yellow>bye</c>\n",
        );
        assert_eq!(cues[0].text, "Hi & bye");
    }

    #[test]
    fn formats_times_with_optional_hours() {
        assert_eq!(format_vtt_time(2.5), "00:02.500");
        assert_eq!(format_vtt_time(3723.004), "01:02:03.004");
        assert_eq!(format_vtt_time(-1.0), "00:00.000");
        assert_eq!(format_vtt_time(59.9996), "01:00.000");
    }

    #[test]
    fn serialized_payload_parses_back() {
        let cues = vec![SubtitleCue {
            start_time: 0.0,
            end_time: 2.5,
            text: "你好".to_string(),
        }];
        let payload = serialize_vtt(&cues);
        assert!(payload.starts_with("WEBVTT\n\n1\n00:00.000 --> 00:02.500\n你好\n\n"));
        assert_eq!(parse_vtt(&payload), cues);
    }

    #[test]
    fn serialized_text_cannot_split_cues() {
        let cues = vec![
            SubtitleCue {
                start_time: 1.0,
                end_time: 2.0,
                text: "第一行\n\n  \n第二行 --> 第三行\n".to_string(),
            },
            SubtitleCue {
                start_time: 3.0,
                end_time: 4.0,
                text: "Next".to_string(),
            },
        ];
        let output = serialize_vtt(&cues);
        assert_eq!(
            output,
            "WEBVTT\n\n1\n00:01.000 --> 00:02.000\n第一行\n第二行 -> 第三行\n\n2\n00:03.000 --> 00:04.000\nNext\n\n"
        );

        let reparsed = parse_vtt(&output);
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed[0].text, "第一行\n第二行 -> 第三行");
        assert_eq!(reparsed[1].text, "Next");
    }
}
