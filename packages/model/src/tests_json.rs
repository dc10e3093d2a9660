/// JSON snapshot tests
/// Round trips every node type and checks unknown-type recovery
use crate::*;

#[cfg(test)]
mod json_tests {
    use super::*;
    use serde_json::json;

    fn every_node_type() -> Fragment {
        Fragment::root()
            .with_child(
                Fragment::heading(HeadingLevel::H2)
                    .with_alignment(Alignment::Center)
                    .with_child(Fragment::text("Title")),
            )
            .with_child(
                Fragment::paragraph()
                    .with_child(Fragment::styled_text(
                        TextNode::new("bold red")
                            .with_format(TextFormat::BOLD | TextFormat::UNDERLINE)
                            .with_style("color: #ff0000;"),
                    ))
                    .with_child(Fragment::element(ElementKind::Link(LinkAttributes {
                        url: "https://example.com".into(),
                        target: Some("_blank".into()),
                        rel: Some("noopener".into()),
                        title: None,
                    }))
                    .with_child(Fragment::text("link")))
                    .with_child(Fragment::image(
                        ImageNode::new("https://example.com/a.png", "alt")
                            .with_size(Dimension::Pixels(320), Dimension::Inherit)
                            .with_caption("caption"),
                    )),
            )
            .with_child(Fragment::quote().with_child(Fragment::text("quoted")))
            .with_child(
                Fragment::element(ElementKind::List {
                    list_type: ListType::Number,
                    start: 3,
                })
                .with_child(Fragment::list_item(3).with_child(Fragment::text("third")))
                .with_child(Fragment::list_item(4).with_child(Fragment::text("fourth"))),
            )
            .with_child(
                Fragment::new(NodeKind::code(Some("rust".into())))
                    .with_child(Fragment::text("fn main() {}")),
            )
            .with_child(
                Fragment::new(NodeKind::table()).with_child(
                    Fragment::new(NodeKind::table_row())
                        .with_child(
                            Fragment::new(NodeKind::table_cell(true))
                                .with_child(Fragment::paragraph().with_child(Fragment::text("h"))),
                        )
                        .with_child(
                            Fragment::new(NodeKind::table_cell(false))
                                .with_child(Fragment::paragraph()),
                        ),
                ),
            )
            .with_child(Fragment::paragraph().with_child(Fragment::new(NodeKind::divider())))
            .with_child(
                Fragment::paragraph().with_child(Fragment::new(NodeKind::youtube("dQw4w9WgXcQ"))),
            )
    }

    #[test]
    fn test_round_trip_every_node_type() {
        let tree = Tree::from_fragment(&every_node_type()).expect("Failed to build tree");
        let snapshot = json::to_json_string(&tree, false).expect("Failed to export");

        let report = json::from_json_str(&snapshot).expect("Failed to import");
        assert!(report.skipped.is_empty());
        let reloaded = report.tree;

        assert_eq!(
            reloaded.to_fragment(reloaded.root()).unwrap(),
            tree.to_fragment(tree.root()).unwrap()
        );
        assert_eq!(json::to_json(&reloaded), json::to_json(&tree));
    }

    #[test]
    fn test_record_shapes() {
        let tree = Tree::from_fragment(&every_node_type()).unwrap();
        let value = json::to_json(&tree);
        let root = &value["root"];

        assert_eq!(root["type"], "root");
        assert_eq!(root["version"], 1);

        let heading = &root["children"][0];
        assert_eq!(heading["type"], "heading");
        assert_eq!(heading["tag"], "h2");
        assert_eq!(heading["format"], "center");
        assert_eq!(heading["direction"], serde_json::Value::Null);

        let text = &root["children"][1]["children"][0];
        assert_eq!(text["format"], 9);
        assert_eq!(text["style"], "color: #ff0000;");

        let image = &root["children"][1]["children"][2];
        assert_eq!(image["type"], "image");
        assert_eq!(image["width"], 320);
        assert_eq!(image["height"], 0);
        assert_eq!(image["maxWidth"], 500);
        assert_eq!(image["altText"], "alt");

        let list = &root["children"][3];
        assert_eq!(list["listType"], "number");
        assert_eq!(list["start"], 3);

        assert_eq!(root["children"][6]["children"][0]["type"], "horizontal-rule");
        assert_eq!(root["children"][7]["children"][0]["videoID"], "dQw4w9WgXcQ");
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let snapshot = json!({
            "root": {
                "type": "root",
                "children": [
                    { "type": "paragraph", "children": [
                        { "type": "text", "text": "kept" },
                        { "type": "mention", "name": "someone" }
                    ]},
                    { "type": "poll", "children": [] },
                    { "type": "paragraph", "children": [] }
                ]
            }
        });

        let report = NodeRegistry::default().import(&snapshot).expect("Failed to import");

        assert_eq!(report.skipped, vec!["mention".to_string(), "poll".to_string()]);
        assert_eq!(report.tree.children(report.tree.root()).len(), 2);
        assert_eq!(report.tree.text_content(report.tree.root()), "kept\n\n");
    }

    #[test]
    fn test_missing_root() {
        let err = json::from_json_str(r#"{"document": {}}"#).unwrap_err();
        assert_eq!(err, JsonError::MissingRoot);
    }

    #[test]
    fn test_malformed_json() {
        let err = json::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, JsonError::Malformed(_)));
    }

    #[test]
    fn test_invalid_required_field() {
        let snapshot = json!({
            "root": { "type": "root", "children": [
                { "type": "heading", "tag": "h9", "children": [] }
            ]}
        });
        let err = NodeRegistry::default().import(&snapshot).unwrap_err();
        assert!(matches!(err, JsonError::InvalidNode { ref node_type, .. } if node_type == "heading"));
    }

    #[test]
    fn test_empty_alignment_reads_as_left() {
        let snapshot = json!({
            "root": { "type": "root", "format": "", "children": [
                { "type": "paragraph", "format": "", "indent": 1, "children": [] }
            ]}
        });
        let tree = NodeRegistry::default().import(&snapshot).unwrap().tree;
        let paragraph = tree.children(tree.root())[0];
        let element = tree.node(paragraph).unwrap().as_element().unwrap();
        assert_eq!(element.format, Alignment::Left);
        assert_eq!(element.indent, 1);
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = NodeRegistry::default();
        assert!(!registry.is_registered("callout"));
        registry.register("callout", |_| Ok(NodeKind::quote()));

        let snapshot = json!({
            "root": { "type": "root", "children": [{ "type": "callout", "children": [] }] }
        });
        let report = registry.import(&snapshot).unwrap();
        assert!(report.skipped.is_empty());
        let first = report.tree.children(report.tree.root())[0];
        assert!(report.tree.node(first).unwrap().is_quote());
    }
}
