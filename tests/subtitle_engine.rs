//! 字幕引擎集成测试
//!
//! 测试字幕解析、批量翻译以及通过控制消息驱动的轨道与浮层呈现

use std::time::Duration;

use ultra_translate::html::{find_nodes, get_node_attr, text_content};
use ultra_translate::subtitle::{parse_captions, CaptionFormat, MemoryCaptionSource, VideoOutcome};
use ultra_translate::translation::config::constants;
use ultra_translate::translation::{BilingualMode, EngineConfig, Settings, SubtitleMode};
use ultra_translate::utils::parse_data_url;
use ultra_translate::vtt::{format_vtt_time, parse_vtt, serialize_vtt};
use ultra_translate::{ControlMessage, ControlReply, Controller};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{DelayedBackend, HtmlTestHelper, MockBackend, SessionBuilder, TestDataGenerator};

fn video_settings(mode: SubtitleMode, bilingual: BilingualMode) -> Settings {
    Settings {
        subtitle_mode: mode,
        bilingual_mode: bilingual,
        ..SessionBuilder::settings()
    }
}

/// 测试单条 VTT 字幕的时间在生成与解析之间保持不变
#[test]
fn test_vtt_time_round_trip() {
    let cues = parse_vtt("WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.500\nHello\n\n");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_time, 0.0);
    assert_eq!(cues[0].end_time, 2.5);
    assert_eq!(cues[0].text, "Hello");

    assert_eq!(format_vtt_time(2.5), "00:02.500");
    assert_eq!(format_vtt_time(3725.25), "01:02:05.250");

    let reparsed = parse_vtt(&serialize_vtt(&cues));
    assert_eq!(reparsed, cues);

    println!("✅ VTT time round trip test passed");
}

/// 测试按内容识别 SRT 与 VTT
#[test]
fn test_format_sniffing() {
    let srt = TestDataGenerator::create_srt(4);
    assert_eq!(CaptionFormat::sniff(&srt), CaptionFormat::Srt);
    let cues = parse_captions(&srt);
    assert_eq!(cues.len(), 4);
    assert_eq!(cues[3].start_time, 6.0);
    assert_eq!(cues[3].end_time, 7.5);

    let vtt = TestDataGenerator::create_vtt(4);
    assert_eq!(CaptionFormat::sniff(&vtt), CaptionFormat::Vtt);
    assert_eq!(parse_captions(&vtt), TestDataGenerator::create_cues(4));

    println!("✅ Format sniffing test passed");
}

/// 测试通过控制消息启用浮层字幕，并随播放时间切换
#[tokio::test]
async fn test_overlay_mode_through_controller() {
    let html = HtmlTestHelper::create_video_page(r#"<track kind="subtitles" srclang="en" src="en.srt">"#);
    let dom = HtmlTestHelper::create_test_dom(&html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload("en.srt", TestDataGenerator::create_srt(3));
    let controller = Controller::new(
        dom.document.clone(),
        MockBackend::new(),
        source,
        EngineConfig::default(),
        SessionBuilder::settings(),
    );

    let reply = controller
        .handle(ControlMessage::UpdateVideoSettings {
            settings: video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
        })
        .await;
    assert_eq!(
        reply,
        ControlReply::VideosProcessed(vec![VideoOutcome::Presented {
            mode: BilingualMode::Overlay,
            cues: 3,
            translated: 3,
        }])
    );

    let video = find_nodes(&dom.document, vec!["video"]).remove(0);
    assert!(get_node_attr(&video, constants::PROCESSED_VIDEO_ATTR).is_some());
    let overlay = HtmlTestHelper::find_by_class(&dom.document, constants::SUBTITLE_OVERLAY_CLASS).remove(0);
    assert!(get_node_attr(&overlay, "style").is_some_and(|style| style.contains("pointer-events: none")));

    let subtitles = controller.subtitles();
    assert!(subtitles.on_time_update(&video, 2.2));
    assert!(!subtitles.on_time_update(&video, 2.4));
    assert_eq!(text_content(&overlay), "Subtitle 1[ZH] Subtitle 1");
    assert!(subtitles.on_time_update(&video, 1.7));
    assert_eq!(text_content(&overlay), "");

    // 字幕设置关闭后清理浮层
    controller
        .handle(ControlMessage::UpdateSettings {
            settings: SessionBuilder::settings(),
        })
        .await;
    assert!(HtmlTestHelper::find_by_class(&dom.document, constants::SUBTITLE_OVERLAY_CLASS).is_empty());
    assert!(get_node_attr(&video, constants::PROCESSED_VIDEO_ATTR).is_none());

    println!("✅ Overlay mode test passed");
}

/// 测试轨道模式注入的双语字幕内容
#[tokio::test]
async fn test_track_mode_payload() {
    let html = HtmlTestHelper::create_video_page(
        r#"<track kind="subtitles" srclang="en" label="English" src="en.vtt" default>"#,
    );
    let dom = HtmlTestHelper::create_test_dom(&html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload("en.vtt", "WEBVTT\n\n00:01.000 --> 00:02.000\nGood morning\n");
    let controller = Controller::new(
        dom.document.clone(),
        MockBackend::new(),
        source,
        EngineConfig::default(),
        video_settings(SubtitleMode::Translate, BilingualMode::Track),
    );

    let outcomes = controller.subtitles().process_all(&dom.document).await;
    assert_eq!(outcomes.len(), 1);

    let tracks = find_nodes(&dom.document, vec!["track"]);
    assert_eq!(tracks.len(), 2);
    let original = &tracks[0];
    let injected = &tracks[1];
    assert!(get_node_attr(original, "default").is_none());
    assert!(get_node_attr(original, constants::SUPPRESSED_TRACK_ATTR).is_some());
    assert!(get_node_attr(injected, "default").is_some());
    assert_eq!(get_node_attr(injected, "kind").as_deref(), Some("subtitles"));

    let src = get_node_attr(injected, "src").expect("injected track src");
    let (_, payload) = parse_data_url(&src).expect("data url");
    let payload = String::from_utf8(payload).unwrap();
    assert_eq!(
        payload,
        "WEBVTT\n\n1\n00:01.000 --> 00:02.000\n[ZH] Good morning\nGood morning\n\n"
    );

    // 同一视频不会重复处理
    let again = controller.subtitles().process_all(&dom.document).await;
    assert_eq!(again, vec![VideoOutcome::AlreadyProcessed]);

    let video = find_nodes(&dom.document, vec!["video"]).remove(0);
    assert!(controller.subtitles().cleanup(&video));
    let tracks = find_nodes(&dom.document, vec!["track"]);
    assert_eq!(tracks.len(), 1);
    assert!(get_node_attr(&tracks[0], "default").is_some());

    println!("✅ Track mode test passed");
}

/// 测试字幕抓取失败时视频被跳过且不影响其他视频
#[tokio::test]
async fn test_fetch_failure_skips_video() {
    let html = r#"<html><body>
        <div><video><track srclang="en" src="missing.vtt"></video></div>
        <div><video><track srclang="en" src="ok.vtt"></video></div>
        <div><video></video></div>
        </body></html>"#;
    let dom = HtmlTestHelper::create_test_dom(html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload("ok.vtt", TestDataGenerator::create_vtt(2));
    let controller = Controller::new(
        dom.document.clone(),
        MockBackend::new(),
        source,
        EngineConfig::default(),
        video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
    );

    let outcomes = controller.subtitles().process_all(&dom.document).await;
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], VideoOutcome::NoCues);
    assert!(matches!(outcomes[1], VideoOutcome::Presented { cues: 2, .. }));
    assert_eq!(outcomes[2], VideoOutcome::NoSubtitles);

    println!("✅ Fetch failure test passed");
}

/// 测试页面翻译不会翻译字幕浮层
#[tokio::test]
async fn test_page_pass_skips_subtitle_overlay() {
    let html = HtmlTestHelper::create_video_page(r#"<track srclang="en" src="en.vtt">"#);
    let dom = HtmlTestHelper::create_test_dom(&html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload("en.vtt", TestDataGenerator::create_vtt(1));
    let controller = Controller::new(
        dom.document.clone(),
        MockBackend::new(),
        source,
        EngineConfig::default(),
        video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
    );

    controller.subtitles().process_all(&dom.document).await;
    let video = find_nodes(&dom.document, vec!["video"]).remove(0);
    controller.subtitles().on_time_update(&video, 0.5);

    let reply = controller.handle(ControlMessage::TranslatePage { settings: None }).await;
    let ControlReply::Translated(Some(report)) = reply else {
        panic!("page pass should run");
    };
    assert_eq!(report.units, 0, "overlay text must not be collected");

    println!("✅ Overlay exclusion test passed");
}

/// 测试重叠字幕：较早开始的长字幕在短字幕结束后继续显示
#[tokio::test]
async fn test_overlay_keeps_overlapping_cue() {
    let html = HtmlTestHelper::create_video_page(r#"<track srclang="en" src="en.vtt">"#);
    let dom = HtmlTestHelper::create_test_dom(&html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload(
        "en.vtt",
        "WEBVTT\n\n00:00.000 --> 00:10.000\nLong narration\n\n00:02.000 --> 00:03.000\nShort line\n",
    );
    let controller = Controller::new(
        dom.document.clone(),
        MockBackend::new(),
        source,
        EngineConfig::default(),
        video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
    );
    controller.subtitles().process_all(&dom.document).await;

    let video = find_nodes(&dom.document, vec!["video"]).remove(0);
    let overlay = HtmlTestHelper::find_by_class(&dom.document, constants::SUBTITLE_OVERLAY_CLASS).remove(0);
    let subtitles = controller.subtitles();

    assert!(subtitles.on_time_update(&video, 2.5));
    assert_eq!(text_content(&overlay), "Short line[ZH] Short line");
    assert!(subtitles.on_time_update(&video, 5.0));
    assert_eq!(text_content(&overlay), "Long narration[ZH] Long narration");
    assert!(!subtitles.on_time_update(&video, 9.9));
    assert!(subtitles.on_time_update(&video, 10.5));
    assert_eq!(text_content(&overlay), "");

    println!("✅ Overlapping cue test passed");
}

/// 测试字幕翻译途中关闭字幕后，重新开启可以再次处理视频
#[tokio::test(start_paused = true)]
async fn test_switching_off_mid_translation_allows_reprocessing() {
    let html = HtmlTestHelper::create_video_page(r#"<track srclang="en" src="en.vtt">"#);
    let dom = HtmlTestHelper::create_test_dom(&html);
    let mut source = MemoryCaptionSource::new();
    source.insert_payload("en.vtt", TestDataGenerator::create_vtt(2));
    let controller = Controller::new(
        dom.document.clone(),
        DelayedBackend::new(Duration::from_millis(200)),
        source,
        EngineConfig::default(),
        video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
    );

    let switch_off = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller
            .handle(ControlMessage::UpdateSettings {
                settings: SessionBuilder::settings(),
            })
            .await
    };
    let (outcomes, reply) = tokio::join!(controller.subtitles().process_all(&dom.document), switch_off);
    assert_eq!(reply, ControlReply::SettingsUpdated);
    assert_eq!(outcomes, vec![VideoOutcome::Cancelled]);

    let video = find_nodes(&dom.document, vec!["video"]).remove(0);
    assert!(get_node_attr(&video, constants::PROCESSED_VIDEO_ATTR).is_none());
    assert!(HtmlTestHelper::find_by_class(&dom.document, constants::SUBTITLE_OVERLAY_CLASS).is_empty());

    let reply = controller
        .handle(ControlMessage::UpdateVideoSettings {
            settings: video_settings(SubtitleMode::Translate, BilingualMode::Overlay),
        })
        .await;
    assert_eq!(
        reply,
        ControlReply::VideosProcessed(vec![VideoOutcome::Presented {
            mode: BilingualMode::Overlay,
            cues: 2,
            translated: 2,
        }])
    );

    println!("✅ Mid-translation switch-off test passed");
}
