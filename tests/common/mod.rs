// 集成测试公共模块
//
// 提供测试页面、模拟翻译后端和断言辅助

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use markup5ever_rcdom::{Handle, RcDom};

use ultra_translate::html::{find_elements, find_nodes, has_class, html_to_dom, serialize_node};
use ultra_translate::subtitle::SubtitleCue;
use ultra_translate::translation::{
    EngineConfig, Settings, TranslateRequest, TranslateResponse, TranslationBackend,
    TranslationError, TranslationResult, TranslationSession,
};
use ultra_translate::vtt::serialize_vtt;

/// 给每段文本加上前缀的后端，并记录每次请求
#[derive(Clone, Default)]
pub struct MockBackend {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockBackend {
    pub const PREFIX: &'static str = "[ZH] ";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls.borrow().iter().flatten().cloned().collect()
    }
}

impl TranslationBackend for MockBackend {
    async fn translate(&self, request: TranslateRequest) -> TranslationResult<Option<TranslateResponse>> {
        self.calls.borrow_mut().push(request.texts.clone());
        Ok(Some(TranslateResponse {
            translations: request
                .texts
                .iter()
                .map(|text| format!("{}{}", Self::PREFIX, text))
                .collect(),
        }))
    }
}

/// 等待固定时间后再回复的后端
#[derive(Clone)]
pub struct DelayedBackend {
    pub inner: MockBackend,
    pub delay: Duration,
}

impl DelayedBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
        }
    }
}

impl TranslationBackend for DelayedBackend {
    async fn translate(&self, request: TranslateRequest) -> TranslationResult<Option<TranslateResponse>> {
        tokio::time::sleep(self.delay).await;
        self.inner.translate(request).await
    }
}

/// 每次调用都失败的后端
#[derive(Clone, Default)]
pub struct FailingBackend;

impl TranslationBackend for FailingBackend {
    async fn translate(&self, _request: TranslateRequest) -> TranslationResult<Option<TranslateResponse>> {
        Err(TranslationError::NetworkError("connection refused".to_string()))
    }
}

/// 返回空响应的后端
#[derive(Clone, Default)]
pub struct EmptyBackend;

impl TranslationBackend for EmptyBackend {
    async fn translate(&self, _request: TranslateRequest) -> TranslationResult<Option<TranslateResponse>> {
        Ok(None)
    }
}

/// HTML 测试辅助
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8".to_string())
    }

    /// 普通文章页面
    pub fn create_article_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head><title>Test Page</title></head>
<body>
<h1>Welcome to the test page</h1>
<p>This is a test paragraph with <span>inline text</span> and <a href="/more">a link</a>.</p>
<ul><li>First list item</li><li>Second list item</li></ul>
<img src="cat.png" alt="A sleeping cat">
<button title="Send the form">Submit now</button>
</body>
</html>"#
            .to_string()
    }

    /// 混有不应翻译内容的页面
    pub fn create_noisy_page() -> String {
        r#"<html><body>
<p>Readable sentence here</p>
<script>var hidden = "script text";</script>
<style>.x { content: "style text"; }</style>
<pre>preformatted text</pre>
<code>let code = text;</code>
<p>12345</p>
<p>-- !! --</p>
<p>https://example.com/path</p>
<p>someone@example.com</p>
<p class="notranslate">Opted out text</p>
<div hidden><p>Hidden paragraph</p></div>
<div style="display: none">Invisible text</div>
<div contenteditable="true">Editable text</div>
<textarea>Typed text</textarea>
</body></html>"#
            .to_string()
    }

    /// 带表单控件的页面
    pub fn create_form_page() -> String {
        r#"<html><body>
<form>
<input type="text" placeholder="Your name">
<input type="submit" value="Send message">
<select><option>First choice</option><option>Second choice</option></select>
<span title="More details here">Details</span>
</form>
</body></html>"#
            .to_string()
    }

    /// 带字幕轨道的视频页面
    pub fn create_video_page(tracks: &str) -> String {
        format!(
            "<html><body><div class=\"player\"><video src=\"movie.mp4\">{}</video></div></body></html>",
            tracks
        )
    }

    pub fn body(dom: &RcDom) -> Handle {
        find_nodes(&dom.document, vec!["body"]).remove(0)
    }

    pub fn serialize(node: &Handle) -> String {
        serialize_node(node).expect("serialization should succeed")
    }

    pub fn find_by_class(root: &Handle, class: &str) -> Vec<Handle> {
        find_elements(root, |element| has_class(element, class))
    }
}

/// 测试数据生成
pub struct TestDataGenerator;

impl TestDataGenerator {
    pub fn create_cues(count: usize) -> Vec<SubtitleCue> {
        (0..count)
            .map(|i| {
                let start = i as f64 * 2.0;
                SubtitleCue::new(start, start + 1.5, format!("Caption line number {}", i))
            })
            .collect()
    }

    pub fn create_vtt(count: usize) -> String {
        serialize_vtt(&Self::create_cues(count))
    }

    pub fn create_srt(count: usize) -> String {
        let mut out = String::new();
        for i in 0..count {
            out.push_str(&format!(
                "{}\n00:00:{:02},000 --> 00:00:{:02},500\nSubtitle {}\n\n",
                i + 1,
                i * 2,
                i * 2 + 1,
                i
            ));
        }
        out
    }
}

/// 会话构建
pub struct SessionBuilder;

impl SessionBuilder {
    pub fn settings() -> Settings {
        Settings {
            target_language: "zh-CN".to_string(),
            ..Settings::default()
        }
    }

    pub fn create<B: TranslationBackend>(dom: &RcDom, backend: B, settings: Settings) -> TranslationSession<B> {
        TranslationSession::new(dom.document.clone(), backend, EngineConfig::default(), settings)
    }
}

/// 断言辅助
pub struct AssertionHelper;

impl AssertionHelper {
    pub fn assert_size_in_range<T>(items: &[T], min: usize, max: usize, description: &str) {
        assert!(
            items.len() >= min && items.len() <= max,
            "{} should be between {} and {}, got {}",
            description,
            min,
            max,
            items.len()
        );
    }

    pub fn assert_none_contains(texts: &[String], needles: &[&str], description: &str) {
        for needle in needles {
            assert!(
                !texts.iter().any(|text| text.contains(needle)),
                "{}: {:?} should not be present in {:?}",
                description,
                needle,
                texts
            );
        }
    }
}
