//! 属性与表单控件翻译
//!
//! 译文直接写入属性或元素文本，替换前的值和写入的译文以 JSON 形式保存在元素自身的
//! `data-ultra-original-attrs` 属性中，恢复时逐项写回原值。

use markup5ever_rcdom::Handle;

use crate::html::{find_elements, get_node_attr, set_node_attr, set_text_content, text_content};
use crate::translation::config::constants::ORIGINAL_ATTRS_ATTR;
use crate::translation::pipeline::{
    read_attribute_records, AttributeRecord, AttributeRecords, AttributeTarget, AttributeUnit,
};

fn write_record(element: &Handle, record: &AttributeRecords) {
    match serde_json::to_string(record) {
        Ok(json) => set_node_attr(element, ORIGINAL_ATTRS_ATTR, Some(json)),
        Err(e) => tracing::warn!("原始属性记录序列化失败: {}", e),
    }
}

fn current_value(element: &Handle, target: &AttributeTarget) -> Option<String> {
    match target {
        AttributeTarget::Attribute(name) => get_node_attr(element, name),
        AttributeTarget::Text => Some(text_content(element)),
    }
}

fn write_value(element: &Handle, key: &str, value: &str) {
    if key == AttributeTarget::Text.record_key() {
        set_text_content(element, value);
    } else {
        set_node_attr(element, key, Some(value.to_string()));
    }
}

/// 把译文写入属性，返回是否发生了修改
///
/// 当前值仍是上次写入的译文时保留原有的原值记录；宿主改写过的值作为新的原值记录。
pub fn apply_attribute_translation(unit: &AttributeUnit, translation: &str) -> bool {
    let translation = translation.trim();
    if translation.is_empty() || translation == unit.text {
        return false;
    }
    let Some(current) = current_value(&unit.element, &unit.target) else {
        return false;
    };

    let key = unit.target.record_key();
    let mut records = read_attribute_records(&unit.element);
    match records.get_mut(key) {
        Some(record) if record.translated == current.trim() => {
            record.translated = translation.to_string();
        }
        _ => {
            records.insert(
                key.to_string(),
                AttributeRecord {
                    original: current,
                    translated: translation.to_string(),
                },
            );
        }
    }
    write_record(&unit.element, &records);

    write_value(&unit.element, key, translation);
    true
}

/// 恢复 `root` 下（包含 `root`）所有被翻译过的属性，返回恢复的元素数
pub fn restore_attributes(root: &Handle) -> usize {
    let elements = find_elements(root, |element| {
        get_node_attr(element, ORIGINAL_ATTRS_ATTR).is_some()
    });

    for element in &elements {
        for (key, record) in read_attribute_records(element) {
            write_value(element, &key, &record.original);
        }
        set_node_attr(element, ORIGINAL_ATTRS_ATTR, None);
    }

    if !elements.is_empty() {
        tracing::debug!("恢复了 {} 个元素的属性", elements.len());
    }
    elements.len()
}
