//! 内联样式读取
//!
//! 使用 cssparser 对 `style` 属性做逐 token 解析，只提取声明名和值，
//! 供可见性判断等场景使用。

use cssparser::{Parser, ParserInput, Token};

/// 声明值中的单个分量
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Keyword(String),
    Number(f32),
    Percentage(f32),
    Dimension(f32, String),
    Other,
}

impl StyleValue {
    /// 数值为零（无论单位）
    pub fn is_zero(&self) -> bool {
        match self {
            StyleValue::Number(value)
            | StyleValue::Percentage(value)
            | StyleValue::Dimension(value, _) => *value == 0.0,
            _ => false,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, StyleValue::Keyword(value) if value.eq_ignore_ascii_case(keyword))
    }
}

/// 一条 `name: value` 声明
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: Vec<StyleValue>,
    pub important: bool,
}

/// 解析后的内联样式
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub declarations: Vec<Declaration>,
}

impl InlineStyle {
    /// 获取属性的生效值（后写的覆盖先写的，`!important` 优先）
    pub fn get(&self, name: &str) -> Option<&[StyleValue]> {
        let mut winner: Option<&Declaration> = None;
        for declaration in self.declarations.iter().filter(|d| d.name == name) {
            match winner {
                Some(current) if current.important && !declaration.important => {}
                _ => winner = Some(declaration),
            }
        }
        winner.map(|declaration| declaration.value.as_slice())
    }

    fn first(&self, name: &str) -> Option<&StyleValue> {
        self.get(name).and_then(|values| values.first())
    }

    /// 样式本身是否让元素不可见
    pub fn hides_element(&self) -> bool {
        if self.first("display").is_some_and(|v| v.is_keyword("none")) {
            return true;
        }
        if self
            .first("visibility")
            .is_some_and(|v| v.is_keyword("hidden") || v.is_keyword("collapse"))
        {
            return true;
        }
        if self.first("opacity").is_some_and(StyleValue::is_zero) {
            return true;
        }
        // 零尺寸盒子
        self.first("width").is_some_and(StyleValue::is_zero)
            || self.first("height").is_some_and(StyleValue::is_zero)
    }
}

/// 解析 `style` 属性内容
pub fn parse_inline_style(css: &str) -> InlineStyle {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut style = InlineStyle::default();

    let mut name: Option<String> = None;
    let mut seen_colon = false;
    let mut value: Vec<StyleValue> = Vec::new();
    let mut important = false;
    let mut bang = false;

    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Semicolon => {
                if let (Some(declared), true) = (name.take(), seen_colon) {
                    style.declarations.push(Declaration {
                        name: declared,
                        value: std::mem::take(&mut value),
                        important,
                    });
                }
                seen_colon = false;
                important = false;
                bang = false;
                value.clear();
            }
            Token::Colon if name.is_some() && !seen_colon => seen_colon = true,
            Token::Ident(ident) if name.is_none() => name = Some(ident.to_ascii_lowercase()),
            Token::Delim('!') if seen_colon => bang = true,
            Token::Ident(ident) if bang && ident.eq_ignore_ascii_case("important") => {
                important = true;
                bang = false;
            }
            Token::Ident(ident) if seen_colon => value.push(StyleValue::Keyword(ident.to_string())),
            Token::Number { value: number, .. } if seen_colon => value.push(StyleValue::Number(number)),
            Token::Percentage { unit_value, .. } if seen_colon => {
                value.push(StyleValue::Percentage(unit_value))
            }
            Token::Dimension {
                value: number,
                unit,
                ..
            } if seen_colon => value.push(StyleValue::Dimension(number, unit.to_ascii_lowercase())),
            _ if seen_colon => value.push(StyleValue::Other),
            // 名称前的杂项 token 视为无效声明
            _ => name = None,
        }
    }

    if let (Some(declared), true) = (name, seen_colon) {
        style.declarations.push(Declaration {
            name: declared,
            value,
            important,
        });
    }

    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_display_none() {
        assert!(parse_inline_style("color: red; display: none").hides_element());
        assert!(parse_inline_style("DISPLAY:NONE;").hides_element());
        assert!(!parse_inline_style("display: block").hides_element());
    }

    #[test]
    fn later_declaration_wins_unless_important() {
        assert!(!parse_inline_style("display:none; display:inline").hides_element());
        assert!(parse_inline_style("display:none !important; display:inline").hides_element());
    }

    #[test]
    fn zero_opacity_and_zero_box_hide() {
        assert!(parse_inline_style("opacity: 0").hides_element());
        assert!(parse_inline_style("opacity: 0%").hides_element());
        assert!(!parse_inline_style("opacity: 0.5").hides_element());
        assert!(parse_inline_style("width: 0px; height: 20px").hides_element());
        assert!(parse_inline_style("visibility: hidden").hides_element());
    }

    #[test]
    fn multi_component_values_are_collected() {
        let style = parse_inline_style("margin: 0 auto 4px");
        assert_eq!(
            style.get("margin").unwrap(),
            &[
                StyleValue::Number(0.0),
                StyleValue::Keyword("auto".to_string()),
                StyleValue::Dimension(4.0, "px".to_string()),
            ]
        );
    }
}
