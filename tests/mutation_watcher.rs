//! 变更监听集成测试
//!
//! 使用暂停的 tokio 时钟验证去抖、增量翻译和重入丢弃

use std::time::Duration;

use tokio::sync::mpsc;

use ultra_translate::html::{append_child, create_element, create_text, set_node_attr, text_content};
use ultra_translate::translation::config::constants;
use ultra_translate::translation::{watch, EngineConfig, MutationRecord, Settings, TranslationSession};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{HtmlTestHelper, MockBackend, SessionBuilder};

fn auto_settings() -> Settings {
    Settings {
        auto_translate: true,
        ..SessionBuilder::settings()
    }
}

fn paragraph(text: &str) -> markup5ever_rcdom::Handle {
    let p = create_element("p", &[]);
    append_child(&p, &create_text(text));
    p
}

/// 测试安静期结束后只翻译新增内容
#[tokio::test(start_paused = true)]
async fn test_debounced_incremental_pass() {
    let dom = HtmlTestHelper::create_test_dom("<html><body><p>Existing paragraph</p></body></html>");
    let body = HtmlTestHelper::body(&dom);
    let backend = MockBackend::new();
    let session = SessionBuilder::create(&dom, backend.clone(), auto_settings());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async {
        let first = paragraph("First loaded paragraph");
        append_child(&body, &first);
        tx.send(vec![MutationRecord::ChildList {
            target: body.clone(),
            added: vec![first.clone()],
        }])
        .unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = paragraph("Second loaded paragraph");
        append_child(&body, &second);
        tx.send(vec![MutationRecord::ChildList {
            target: body.clone(),
            added: vec![second.clone()],
        }])
        .unwrap();

        // 第二次变更把截止时间推迟到 2500ms
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(backend.call_count(), 0, "still inside the quiet period");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(backend.call_count(), 1, "one coalesced request");
        assert!(text_content(&first).contains(MockBackend::PREFIX));
        assert!(text_content(&second).contains(MockBackend::PREFIX));

        drop(tx);
    };

    let (stats, ()) = tokio::join!(watch(&session, rx), driver);

    assert_eq!(stats.passes, 1);
    assert_eq!(stats.records_seen, 2);
    let sent = backend.sent_texts();
    assert!(!sent.iter().any(|text| text == "Existing paragraph"), "only new content is sent");
    assert!(!session.indicator_visible(), "incremental passes do not show the indicator");

    println!("✅ Debounced incremental pass test passed");
}

/// 测试没有开启自动翻译时变更被忽略
#[tokio::test(start_paused = true)]
async fn test_changes_ignored_without_auto_translate() {
    let dom = HtmlTestHelper::create_test_dom("<html><body></body></html>");
    let body = HtmlTestHelper::body(&dom);
    let backend = MockBackend::new();
    let session = SessionBuilder::create(&dom, backend.clone(), SessionBuilder::settings());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async {
        let p = paragraph("Loaded later");
        append_child(&body, &p);
        tx.send(vec![MutationRecord::ChildList {
            target: body.clone(),
            added: vec![p],
        }])
        .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(tx);
    };

    let (stats, ()) = tokio::join!(watch(&session, rx), driver);
    assert_eq!(stats.passes, 0);
    assert_eq!(backend.call_count(), 0);

    println!("✅ Auto-translate gate test passed");
}

/// 测试翻译进行中时到期的一轮被丢弃而不是排队
#[tokio::test(start_paused = true)]
async fn test_round_dropped_while_pass_running() {
    let mut html = String::from("<html><body>");
    for i in 0..400 {
        html.push_str(&format!("<p>Paragraph {}</p>", i));
    }
    html.push_str("</body></html>");
    let dom = HtmlTestHelper::create_test_dom(&html);
    let body = HtmlTestHelper::body(&dom);
    let config = EngineConfig {
        debounce_ms: 100,
        ..EngineConfig::default()
    };
    let session = TranslationSession::new(dom.document.clone(), MockBackend::new(), config, auto_settings());
    let (tx, rx) = mpsc::unbounded_channel();

    let late = paragraph("Arrived during the page pass");
    let driver = async {
        // 400 个片段按 30 条分批共 14 批，分 5 个波次，每个波次后暂停 50ms
        let page = session.translate_page();
        let changes = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            append_child(&body, &late);
            tx.send(vec![MutationRecord::ChildList {
                target: body.clone(),
                added: vec![late.clone()],
            }])
            .unwrap();
        };
        let (report, ()) = tokio::join!(page, changes);
        assert_eq!(report.expect("page pass should run").batches, 14);
        drop(tx);
    };

    let (stats, ()) = tokio::join!(watch(&session, rx), driver);

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.passes, 0);
    assert!(!text_content(&late).contains(MockBackend::PREFIX), "dropped round is not deferred");
    assert!(!session.is_running());

    println!("✅ Re-entrancy test passed - {:?}", stats);
}

/// 测试属性变更触发翻译
#[tokio::test(start_paused = true)]
async fn test_attribute_change_triggers_pass() {
    let dom = HtmlTestHelper::create_test_dom("<html><body><img src=\"a.png\"></body></html>");
    let img = ultra_translate::html::find_nodes(&dom.document, vec!["img"]).remove(0);
    let backend = MockBackend::new();
    let session = SessionBuilder::create(&dom, backend.clone(), auto_settings());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async {
        set_node_attr(&img, "alt", Some("A picture of a dog".to_string()));
        tx.send(vec![
            MutationRecord::Attributes {
                target: img.clone(),
                name: "alt".to_string(),
            },
            MutationRecord::Attributes {
                target: img.clone(),
                name: constants::ORIGINAL_ATTRS_ATTR.to_string(),
            },
        ])
        .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(tx);
    };

    let (stats, ()) = tokio::join!(watch(&session, rx), driver);
    assert_eq!(stats.passes, 1);
    assert_eq!(
        ultra_translate::html::get_node_attr(&img, "alt").as_deref(),
        Some("[ZH] A picture of a dog")
    );

    println!("✅ Attribute mutation test passed");
}

/// 测试宿主改写已翻译的属性后重新翻译，且还原为宿主写入的值
#[tokio::test(start_paused = true)]
async fn test_host_attribute_change_is_retranslated() {
    let dom = HtmlTestHelper::create_test_dom(r#"<html><body><a href="/" title="Go home">Home</a></body></html>"#);
    let link = ultra_translate::html::find_nodes(&dom.document, vec!["a"]).remove(0);
    let backend = MockBackend::new();
    let session = SessionBuilder::create(&dom, backend.clone(), auto_settings());

    session.translate_page().await.expect("initial pass");
    assert_eq!(
        ultra_translate::html::get_node_attr(&link, "title").as_deref(),
        Some("[ZH] Go home")
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let driver = async {
        set_node_attr(&link, "title", Some("Open settings".to_string()));
        tx.send(vec![MutationRecord::Attributes {
            target: link.clone(),
            name: "title".to_string(),
        }])
        .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(tx);
    };

    let (stats, ()) = tokio::join!(watch(&session, rx), driver);
    assert_eq!(stats.passes, 1);
    assert_eq!(
        ultra_translate::html::get_node_attr(&link, "title").as_deref(),
        Some("[ZH] Open settings")
    );
    assert!(backend.sent_texts().contains(&"Open settings".to_string()));

    session.restore();
    assert_eq!(
        ultra_translate::html::get_node_attr(&link, "title").as_deref(),
        Some("Open settings")
    );
    assert_eq!(text_content(&link), "Home");

    println!("✅ Host attribute rewrite test passed");
}
