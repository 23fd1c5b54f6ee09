//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（解析、属性、父子关系、节点创建与替换）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

// 重新导出主要的公共 API
pub use dom::{
    ancestors, append_child, create_element, create_text, find_elements, find_nodes, get_body,
    get_child_node_by_name, get_classes, get_document_lang, get_node_attr, get_node_name,
    get_parent_element, get_parent_node, get_text, has_class, html_to_dom, insert_after,
    is_attached_to, is_element, is_text, remove_node, replace_node, serialize_node, set_node_attr,
    set_text_content, text_content,
};
pub use serializer::serialize_document;
