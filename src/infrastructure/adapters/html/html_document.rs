//! HTML Document Adapter - 把 HTML 转换为内容树
//!
//! 使用 scraper 解析 HTML，为每个元素计算能力描述（类别、可见、可编辑、已处理），
//! 收集器只依赖生成的 DocumentTree。

use scraper::{ElementRef, Html, Node};

use crate::domain::{DocumentTree, DomainError, ElementCategory, NodeCapabilities};

/// 已处理标记属性
pub const PROCESSED_ATTR: &str = "data-klartext-processed";

/// HTML 文档解析
pub struct HtmlDocument;

impl HtmlDocument {
    /// 解析 HTML 文本
    ///
    /// Html 不是 Send，解析在同步代码中完成，只返回 DocumentTree
    pub fn parse(html: &str) -> Result<DocumentTree, DomainError> {
        if html.trim().is_empty() {
            return Err(DomainError::DocumentParse("empty document".to_string()));
        }

        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut tree = DocumentTree::new(root.value().name(), capabilities(&root));

        let mut stack: Vec<_> = root
            .children()
            .rev()
            .map(|child| (child, tree.root()))
            .collect();

        while let Some((node, parent)) = stack.pop() {
            match node.value() {
                Node::Text(text) => {
                    tree.append_text(parent, &**text)?;
                }
                Node::Element(_) => {
                    let Some(element) = ElementRef::wrap(node) else {
                        continue;
                    };
                    let tag = element.value().name();
                    if tag == "br" {
                        tree.append_text(parent, "\n")?;
                        continue;
                    }
                    let id = tree.append_element(parent, tag, capabilities(&element))?;
                    stack.extend(node.children().rev().map(|child| (child, id)));
                }
                // 注释、doctype 等
                _ => {}
            }
        }

        tracing::debug!(nodes = tree.len(), "HTML document parsed");
        Ok(tree)
    }
}

fn category(tag: &str) -> ElementCategory {
    match tag {
        "script" | "noscript" | "template" => ElementCategory::Script,
        "style" => ElementCategory::Style,
        "form" | "input" | "textarea" | "select" | "option" | "optgroup" | "button"
        | "datalist" | "output" => ElementCategory::FormControl,
        "img" | "video" | "audio" | "canvas" | "svg" | "picture" | "iframe" | "object"
        | "embed" | "math" | "map" | "source" | "track" => ElementCategory::Media,
        "nav" | "header" | "footer" | "aside" | "menu" => ElementCategory::Navigation,
        "pre" | "code" | "kbd" | "samp" | "var" => ElementCategory::Code,
        "head" | "title" | "meta" | "link" | "base" => ElementCategory::Metadata,
        "html" | "body" | "main" | "article" | "section" | "div" | "p" | "li"
        | "ul" | "ol" | "dl" | "dt" | "dd" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        | "blockquote" | "figure" | "figcaption" | "table" | "thead" | "tbody" | "tfoot"
        | "tr" | "td" | "th" | "caption" | "details" | "summary" | "address" | "hgroup"
        | "fieldset" | "legend" | "center" => ElementCategory::Block,
        _ => ElementCategory::Inline,
    }
}

fn capabilities(element: &ElementRef<'_>) -> NodeCapabilities {
    let el = element.value();
    NodeCapabilities {
        category: category(el.name()),
        visible: !is_hidden(el),
        editable: el
            .attr("contenteditable")
            .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false")),
        processed: el.attr(PROCESSED_ATTR).is_some(),
    }
}

fn is_hidden(el: &scraper::node::Element) -> bool {
    if el.attr("hidden").is_some() {
        return true;
    }
    if el
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    match el.attr("style") {
        Some(style) => {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::NodeData;
    use crate::domain::{collect, EligibilityPolicy};

    fn texts(html: &str) -> Vec<String> {
        let tree = HtmlDocument::parse(html).unwrap();
        collect(&tree, &EligibilityPolicy::new(10))
            .into_iter()
            .map(|s| s.original_text().to_string())
            .collect()
    }

    #[test]
    fn test_paragraphs_with_inline_markup() {
        let html = r#"<html><head><title>Amt für Bürgerdienste</title></head><body>
            <h1>Wohnsitz anmelden</h1>
            <p>Sie müssen sich <b>innerhalb von zwei Wochen</b> nach dem Einzug
               <a href="/termin">beim Bürgeramt</a> anmelden.</p>
        </body></html>"#;

        assert_eq!(
            texts(html),
            vec![
                "Wohnsitz anmelden",
                "Sie müssen sich innerhalb von zwei Wochen nach dem Einzug beim Bürgeramt anmelden.",
            ]
        );
    }

    #[test]
    fn test_skipped_regions() {
        let html = r#"<body>
            <nav><p>Startseite und Kontaktformular</p></nav>
            <script>var x = "ein sehr langer Skripttext";</script>
            <style>p { color: red; }</style>
            <div hidden><p>Versteckter Absatz mit Text</p></div>
            <div style="display: none"><p>Auch versteckt, per Style</p></div>
            <p aria-hidden="true">Für Screenreader ausgeblendet</p>
            <div contenteditable="true">Benutzereingabe im Editor</div>
            <p data-klartext-processed>Bereits vereinfachter Absatz</p>
            <pre>fn main() { println!("hallo welt"); }</pre>
            <form><label>Ihr Name bitte hier</label><input name="n"></form>
            <p>Dieser Absatz wird vereinfacht.</p>
        </body>"#;

        assert_eq!(texts(html), vec!["Dieser Absatz wird vereinfacht."]);
    }

    #[test]
    fn test_contenteditable_false_is_not_editable() {
        let html = r#"<body><p contenteditable="false">Nicht bearbeitbarer Absatz</p></body>"#;
        assert_eq!(texts(html), vec!["Nicht bearbeitbarer Absatz"]);
    }

    #[test]
    fn test_line_break_becomes_whitespace() {
        let html = "<body><p>Erste Zeile<br>zweite Zeile des Absatzes</p></body>";
        assert_eq!(texts(html), vec!["Erste Zeile zweite Zeile des Absatzes"]);
    }

    #[test]
    fn test_text_around_nested_paragraph() {
        let html = "<html><body><div>Einleitung zum Thema<p>Ein eigener Absatz mit Inhalt.</p>und weiter geht es hier</div></body></html>";
        assert_eq!(
            texts(html),
            vec![
                "Einleitung zum Thema und weiter geht es hier",
                "Ein eigener Absatz mit Inhalt.",
            ]
        );
    }

    #[test]
    fn test_nested_list_items_are_separate() {
        let html = r#"<body><ul>
            <li>Personalausweis oder Reisepass</li>
            <li>Wohnungsgeberbestätigung <em>vom Vermieter</em></li>
        </ul></body>"#;

        assert_eq!(
            texts(html),
            vec![
                "Personalausweis oder Reisepass",
                "Wohnungsgeberbestätigung vom Vermieter",
            ]
        );
    }

    #[test]
    fn test_tree_shape() {
        let tree = HtmlDocument::parse("<p>Hallo</p>").unwrap();
        let root = tree.get(tree.root()).unwrap();
        assert!(matches!(root.data(), NodeData::Element { tag, .. } if tag == "html"));
        assert!(HtmlDocument::parse("   ").is_err());
    }
}
