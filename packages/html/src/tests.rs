use crate::*;
use quire_model::{
    Alignment, Dimension, ElementKind, Fragment, HeadingLevel, ImageNode, ListType, NodeKind,
    TextFormat, TextNode, Tree,
};

fn tree(fragment: Fragment) -> Tree {
    Tree::from_fragment(&fragment).expect("Failed to build tree")
}

fn html(tree: &Tree) -> String {
    render_html(tree, &HtmlTheme::default(), &RenderOptions::default()).expect("Failed to export")
}

fn import(source: &str) -> Tree {
    tree(import_html(source, &ConversionMap::default()))
}

#[test]
fn test_export_heading() {
    let doc = tree(
        Fragment::root()
            .with_child(Fragment::heading(HeadingLevel::H2).with_child(Fragment::text("Title"))),
    );
    assert_eq!(html(&doc), "<h2>Title</h2>");
}

#[test]
fn test_export_text_formats_nest() {
    let doc = tree(
        Fragment::root().with_child(
            Fragment::paragraph()
                .with_child(Fragment::text("plain "))
                .with_child(Fragment::styled_text(
                    TextNode::new("both").with_format(TextFormat::BOLD | TextFormat::ITALIC),
                ))
                .with_child(Fragment::styled_text(
                    TextNode::new("red").with_style("color: #ff0000;"),
                )),
        ),
    );
    assert_eq!(
        html(&doc),
        "<p>plain <strong><em>both</em></strong><span style=\"color: #ff0000;\">red</span></p>"
    );
}

#[test]
fn test_export_theme_and_alignment() {
    let doc = tree(
        Fragment::root().with_child(
            Fragment::paragraph()
                .with_alignment(Alignment::Center)
                .with_child(Fragment::styled_text(
                    TextNode::new("b").with_format(TextFormat::BOLD),
                )),
        ),
    );
    let theme = HtmlTheme::default()
        .with_class("paragraph", "editor-paragraph")
        .with_class("text.bold", "editor-text-bold");
    let out = render_html(&doc, &theme, &RenderOptions::default()).unwrap();
    assert_eq!(
        out,
        "<p class=\"editor-paragraph\" style=\"text-align: center;\"><strong class=\"editor-text-bold\">b</strong></p>"
    );
}

#[test]
fn test_export_lists_and_empty_blocks() {
    let doc = tree(
        Fragment::root()
            .with_child(
                Fragment::element(ElementKind::List {
                    list_type: ListType::Number,
                    start: 2,
                })
                .with_child(Fragment::list_item(2).with_child(Fragment::text("two"))),
            )
            .with_child(Fragment::paragraph()),
    );
    assert_eq!(
        html(&doc),
        "<ol start=\"2\"><li value=\"2\">two</li></ol><p><br /></p>"
    );
}

#[test]
fn test_export_decorators() {
    let doc = tree(
        Fragment::root()
            .with_child(Fragment::paragraph().with_child(Fragment::image(
                ImageNode::new("a.png", "An image").with_size(Dimension::Pixels(200), Dimension::Inherit),
            )))
            .with_child(Fragment::paragraph().with_child(Fragment::new(NodeKind::divider())))
            .with_child(
                Fragment::paragraph().with_child(Fragment::new(NodeKind::youtube("dQw4w9WgXcQ"))),
            ),
    );
    let out = html(&doc);
    assert!(out.contains("<img src=\"a.png\" alt=\"An image\" width=\"200\" />"));
    assert!(out.contains("<hr />"));
    assert!(out.contains("data-lexical-youtube=\"dQw4w9WgXcQ\""));
    assert!(out.contains("src=\"https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ\""));
}

#[test]
fn test_import_basic_blocks() {
    let doc = import("<h1>Hello</h1><p>Some <b>bold</b> and <i>italic</i></p><blockquote>q</blockquote>");
    let root = doc.root();
    let blocks = doc.children(root);
    assert_eq!(blocks.len(), 3);
    assert!(doc.node(blocks[0]).unwrap().is_heading());
    assert!(doc.node(blocks[2]).unwrap().is_quote());

    let runs = doc.children(blocks[1]);
    assert_eq!(runs.len(), 4);
    let bold = doc.node(runs[1]).unwrap().as_text().unwrap();
    assert_eq!(bold.text, "bold");
    assert_eq!(bold.format, TextFormat::BOLD);
    doc.validate().unwrap();
}

#[test]
fn test_import_round_trip_matches_export() {
    let source = Fragment::root()
        .with_child(Fragment::heading(HeadingLevel::H3).with_child(Fragment::text("Head")))
        .with_child(
            Fragment::paragraph()
                .with_child(Fragment::text("see "))
                .with_child(Fragment::link("https://example.com").with_child(Fragment::text("this")))
                .with_child(Fragment::styled_text(
                    TextNode::new(" now").with_format(TextFormat::UNDERLINE),
                )),
        )
        .with_child(
            Fragment::list(ListType::Bullet)
                .with_child(Fragment::list_item(1).with_child(Fragment::text("a")))
                .with_child(Fragment::list_item(2).with_child(Fragment::text("b"))),
        );
    let original = tree(source);
    let reimported = import(&html(&original));

    assert_eq!(
        reimported.to_fragment(reimported.root()).unwrap(),
        original.to_fragment(original.root()).unwrap()
    );
}

#[test]
fn test_div_priority_prefers_youtube() {
    let doc = import("<div data-lexical-youtube=\"abcdefghijk\"></div><div>plain</div>");
    let blocks = doc.children(doc.root());
    assert_eq!(blocks.len(), 2);

    let embed = doc.children(blocks[0])[0];
    assert!(doc.node(embed).unwrap().is_youtube());
    assert!(doc.node(blocks[1]).unwrap().is_paragraph());
    assert_eq!(doc.text_content(blocks[1]), "plain");
}

#[test]
fn test_priority_beats_registration_order() {
    let mut map = ConversionMap::empty();
    map.register("div", "youtube", 1, |e| {
        e.attr("data-video").map(|id| Conversion::Node(NodeKind::youtube(id)))
    });
    map.register("div", "paragraph", 0, |_| Some(Conversion::Node(NodeKind::paragraph())));
    map.register("div", "quote", 0, |_| Some(Conversion::Node(NodeKind::quote())));

    let candidates: Vec<&str> = map.candidates("div").iter().map(|c| c.node_type).collect();
    assert_eq!(candidates, vec!["youtube", "paragraph", "quote"]);

    let generic = DomElement::new("div");
    assert_eq!(map.resolve(&generic), Some(Conversion::Node(NodeKind::paragraph())));
}

#[test]
fn test_import_rejects_local_image() {
    let doc = import("<p><img src=\"file:///C:/secret.png\" alt=\"x\"><img src=\"https://a.dev/b.png\" width=\"40\"></p>");
    let paragraph = doc.children(doc.root())[0];
    let children = doc.children(paragraph);
    assert_eq!(children.len(), 1);
    let image = doc.node(children[0]).unwrap();
    assert!(image.is_image());
}

#[test]
fn test_import_rejects_script_and_data_images() {
    let doc = import(concat!(
        "<p><img src=\"javascript:alert(2)\">",
        "<img src=\" JavaScript:alert(3)\">",
        "<img src=\"data:image/png;base64,AAAA\">",
        "<img src=\"/static/a.png\"></p>",
    ));
    let paragraph = doc.children(doc.root())[0];
    let children = doc.children(paragraph);
    assert_eq!(children.len(), 1);
    assert!(doc.node(children[0]).unwrap().is_image());
}

#[test]
fn test_media_source_schemes() {
    assert!(is_allowed_media_source("https://a.dev/b.png"));
    assert!(is_allowed_media_source("HTTP://a.dev/b.png"));
    assert!(is_allowed_media_source("images/b.png"));
    assert!(is_allowed_media_source("/b.png?at=1:2"));
    assert!(!is_allowed_media_source("javascript:alert(1)"));
    assert!(!is_allowed_media_source("file:///C:/secret.png"));
    assert!(!is_allowed_media_source("data:image/png;base64,AAAA"));
}

#[test]
fn test_import_wraps_loose_inline_content() {
    let doc = import("loose <em>text</em><hr>after");
    let blocks = doc.children(doc.root());
    assert_eq!(blocks.len(), 3);
    assert_eq!(doc.text_content(blocks[0]), "loose text");
    assert!(doc.node(doc.children(blocks[1])[0]).unwrap().is_divider());
    assert_eq!(doc.text_content(blocks[2]), "after");
    doc.validate().unwrap();
}

#[test]
fn test_import_code_keeps_whitespace() {
    let doc = import("<pre data-language=\"rust\"><code>fn main() {\n    run();\n}</code></pre>");
    let code = doc.children(doc.root())[0];
    let node = doc.node(code).unwrap();
    assert_eq!(
        node.element_kind(),
        Some(&ElementKind::Code {
            language: Some("rust".into())
        })
    );
    let text = doc.children(code)[0];
    let text = doc.node(text).unwrap().as_text().unwrap();
    assert_eq!(text.text, "fn main() {\n    run();\n}");
    assert!(text.format.is_empty());
}

#[test]
fn test_import_span_styles() {
    let doc = import("<p><span style=\"font-weight: 700; color: #00ff00\">x</span></p>");
    let paragraph = doc.children(doc.root())[0];
    let text = doc.node(doc.children(paragraph)[0]).unwrap().as_text().unwrap();
    assert_eq!(text.format, TextFormat::BOLD);
    assert_eq!(text.style, "color: #00ff00;");
}

#[test]
fn test_import_table() {
    let doc = import("<table><tbody><tr><th>h</th><td colspan=\"2\">c</td></tr></tbody></table>");
    let table = doc.children(doc.root())[0];
    assert!(doc.node(table).unwrap().is_table());
    let row = doc.children(table)[0];
    let cells = doc.children(row);
    assert_eq!(cells.len(), 2);
    assert_eq!(
        doc.node(cells[1]).unwrap().element_kind(),
        Some(&ElementKind::TableCell {
            header: false,
            col_span: 2,
            row_span: 1
        })
    );
    // cell content is wrapped in a paragraph
    assert!(doc.node(doc.children(cells[0])[0]).unwrap().is_paragraph());
}

#[test]
fn test_import_ignores_scripts_and_unknown_wrappers() {
    let doc = import("<html><head><title>t</title></head><body><section><p>kept</p></section><script>alert(1)</script></body></html>");
    let blocks = doc.children(doc.root());
    assert_eq!(blocks.len(), 1);
    assert_eq!(doc.text_content(blocks[0]), "kept");
}

#[test]
fn test_import_ordered_list_values() {
    let doc = import("<ol start=\"5\"><li>a</li><li>b</li></ol>");
    let list = doc.children(doc.root())[0];
    let items = doc.children(list);
    assert_eq!(
        doc.node(items[1]).unwrap().element_kind(),
        Some(&ElementKind::ListItem { value: 6 })
    );
}

#[test]
fn test_import_ordered_list_start_at_max() {
    let doc = import("<ol start=\"4294967295\"><li>a</li><li>b</li></ol>");
    let list = doc.children(doc.root())[0];
    let items = doc.children(list);
    assert_eq!(items.len(), 2);
    assert_eq!(
        doc.node(items[1]).unwrap().element_kind(),
        Some(&ElementKind::ListItem { value: u32::MAX })
    );
}
