use base64::{prelude::BASE64_STANDARD, Engine};
pub use url::Url;

use crate::translation::error::TranslationResult;

/// 构造 `data:` URL
pub fn create_data_url(media_type: &str, charset: &str, data: &[u8]) -> String {
    let media_type = if media_type.is_empty() {
        "text/plain"
    } else {
        media_type
    };
    if charset.is_empty() {
        format!("data:{};base64,{}", media_type, BASE64_STANDARD.encode(data))
    } else {
        format!(
            "data:{};charset={};base64,{}",
            media_type,
            charset,
            BASE64_STANDARD.encode(data)
        )
    }
}

/// 解析 `data:` URL，返回媒体类型和解码后的内容
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let media_type = meta
        .split(';')
        .next()
        .filter(|value| !value.is_empty())
        .unwrap_or("text/plain")
        .to_string();
    let data = if meta.ends_with(";base64") {
        BASE64_STANDARD.decode(payload.trim()).ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((media_type, data))
}

/// 将相对地址解析为绝对地址
pub fn resolve_url(base: Option<&Url>, input: &str) -> TranslationResult<Url> {
    match base {
        Some(base) => Ok(base.join(input)?),
        None => Ok(Url::parse(input)?),
    }
}

/// 当前页面是否命中排除列表（逐行子串匹配）
pub fn is_excluded_site<'a>(page_url: &str, patterns: impl IntoIterator<Item = &'a str>) -> bool {
    patterns
        .into_iter()
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| page_url.contains(pattern))
}
