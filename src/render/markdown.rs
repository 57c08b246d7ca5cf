//! Markdown renderer — the fixed screen specification template.
//!
//! Every value comes from the OutputDocument; headings, labels and column
//! headers are template text.

use crate::model::*;
use crate::render::Renderer;
use crate::toc;
use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub struct MarkdownRenderer;

/// An unescaped pipe (start of text or any character but a backslash before it).
static RE_BARE_PIPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|[^\\])\|").unwrap());

const EMPTY_CELL: &str = "-";
const DATE_FORMAT: &str = "%Y-%m-%d";

const ITEM_COLUMNS: [&str; 7] = [
    "STT",
    "Tên thành phần",
    "Loại",
    "Bắt buộc",
    "Mặc định",
    "Mô tả",
    "Action",
];

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &OutputDocument) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();

        render_metadata(&mut lines, &doc.metadata);

        lines.push("## Mục lục\n".to_string());
        for title in toc::SECTION_TITLES {
            lines.push(toc::render_toc_item(title));
        }
        lines.push(String::new());

        lines.push(format!("## {}\n", toc::SECTION_TITLES[0]));
        lines.push(or_empty(doc.overview.trim()).to_string());
        lines.push(String::new());

        lines.push(format!("## {}\n", toc::SECTION_TITLES[1]));
        for group in &doc.groups {
            render_group(&mut lines, group);
        }

        lines.push(format!("## {}\n", toc::SECTION_TITLES[2]));
        render_flow(&mut lines, &doc.flow);

        lines.push(format!("## {}\n", toc::SECTION_TITLES[3]));
        render_rules(&mut lines, &doc.rules);

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn or_empty(text: &str) -> &str {
    if text.is_empty() {
        EMPTY_CELL
    } else {
        text
    }
}

/// Escape a value for a table cell: pipes escaped, line breaks as `<br>`.
/// Only the cell's outer whitespace is dropped; markdown would drop it anyway.
pub fn cell(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return EMPTY_CELL.to_string();
    }
    // Applied twice: adjacent pipes share the character between them.
    let escaped = RE_BARE_PIPE.replace_all(text, r"$1\|");
    let escaped = RE_BARE_PIPE.replace_all(&escaped, r"$1\|");
    escaped.lines().collect::<Vec<_>>().join("<br>")
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn table_header(columns: &[&str]) -> Vec<String> {
    vec![
        format!("| {} |", columns.join(" | ")),
        format!("|{}", "---|".repeat(columns.len())),
    ]
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| EMPTY_CELL.to_string())
}

fn render_metadata(lines: &mut Vec<String>, m: &Metadata) {
    let title: Vec<&str> = [&m.screen_code, &m.screen_name]
        .into_iter()
        .filter_map(|o| o.as_deref())
        .collect();
    if title.is_empty() {
        lines.push("# Đặc tả màn hình\n".to_string());
    } else {
        lines.push(format!("# {}\n", title.join(" ")));
    }

    let text = |o: &Option<String>| cell(o.as_deref().unwrap_or(""));
    lines.extend(table_header(&["Mục", "Giá trị"]));
    for (label, value) in [
        ("Mã màn hình", text(&m.screen_code)),
        ("Tên màn hình", text(&m.screen_name)),
        ("Mô tả", text(&m.description)),
        ("Ngày tạo", date(m.created)),
        ("Ngày cập nhật", date(m.updated)),
        ("Phiên bản", cell(&m.version)),
    ] {
        lines.push(table_row(&[label.to_string(), value]));
    }
    lines.push(String::new());
}

pub fn requirement_label(r: Requirement) -> &'static str {
    match r {
        Requirement::Required => "Bắt buộc",
        Requirement::Conditional => "Bắt buộc có điều kiện",
        Requirement::None => EMPTY_CELL,
    }
}

fn render_group(lines: &mut Vec<String>, group: &ItemGroup) {
    lines.push(format!("### {}\n", group.kind.title()));
    lines.extend(table_header(&ITEM_COLUMNS));
    for item in &group.items {
        let r = &item.row;
        lines.push(table_row(&[
            cell(&r.item_number),
            cell(&join_present(&[&r.name_ja, &r.name_en])),
            cell(&r.item_type),
            requirement_label(r.required).to_string(),
            cell(&r.initial_value),
            cell(&join_present(&[&item.description_ja, &item.description_en])),
            cell(item.action.as_str()),
        ]));
    }
    lines.push(String::new());
}

fn render_flow(lines: &mut Vec<String>, flow: &[FlowStep]) {
    if flow.is_empty() {
        lines.push(format!("{EMPTY_CELL}\n"));
        return;
    }
    for (n, step) in flow.iter().enumerate() {
        let trigger = step.trigger.lines().map(str::trim).collect::<Vec<_>>().join(" / ");
        lines.push(format!("{}. **Action {}**: {}", n + 1, step.action_id, or_empty(&trigger)));
        if !step.transition.is_empty() {
            lines.push(format!("   - Chuyển màn hình: {}", step.transition.replace('\n', " ")));
        }
        for line in step.detail.lines().map(str::trim).filter(|l| !l.is_empty()) {
            lines.push(format!("   - {}", line));
        }
    }
    lines.push(String::new());
}

fn field_rule_text(rule: &FieldRule) -> String {
    let mut parts: Vec<String> = Vec::new();
    if rule.required != Requirement::None {
        parts.push(requirement_label(rule.required).to_string());
    }
    for (label, value) in [
        ("Kiểu dữ liệu", &rule.data_type),
        ("Độ dài tối đa", &rule.max_length),
        ("Định dạng", &rule.format),
    ] {
        if !value.is_empty() {
            parts.push(format!("{}: {}", label, value));
        }
    }
    cell(&parts.join("\n"))
}

fn render_rules(lines: &mut Vec<String>, rules: &ValidationRules) {
    lines.push("### Error Codes\n".to_string());
    if rules.error_codes.is_empty() {
        lines.push(EMPTY_CELL.to_string());
    }
    for entry in &rules.error_codes {
        match &entry.explanation {
            Some(text) => lines.push(format!("- **{}**: {}", entry.code, text.replace('\n', " "))),
            None => lines.push(format!("- **{}**", entry.code)),
        }
    }
    lines.push(String::new());

    lines.push("### Field Validation\n".to_string());
    lines.extend(table_header(&["Field", "Rule"]));
    for rule in &rules.field_rules {
        lines.push(table_row(&[cell(&rule.field), field_rule_text(rule)]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutputDocument {
        OutputDocument {
            metadata: Metadata {
                screen_code: Some("LGN_01".to_string()),
                screen_name: Some("ログイン画面".to_string()),
                description: None,
                created: NaiveDate::from_ymd_opt(2024, 5, 1),
                updated: NaiveDate::from_ymd_opt(2024, 6, 2),
                version: "1.0".to_string(),
            },
            overview: "ログインする画面。".to_string(),
            groups: vec![ItemGroup {
                kind: GroupKind::MainComponents,
                items: vec![EnrichedItem {
                    row: ItemRow {
                        item_number: "1".to_string(),
                        name_ja: "ログイン".to_string(),
                        name_en: "Login".to_string(),
                        item_type: "ボタン".to_string(),
                        ..Default::default()
                    },
                    action: ActionText::Resolved {
                        ids: vec!["1".to_string()],
                        text: "Click X\n=====\nNavigate to Y".to_string(),
                    },
                    description_ja: String::new(),
                    description_en: "Shows the name.".to_string(),
                }],
            }],
            flow: vec![FlowStep {
                action_id: "1".to_string(),
                trigger: "押下\nClick X".to_string(),
                transition: "HOM_01".to_string(),
                detail: "Navigate to Y".to_string(),
            }],
            rules: ValidationRules {
                error_codes: vec![ErrorCodeEntry {
                    code: "HCK-001".to_string(),
                    explanation: Some("必須入力です。".to_string()),
                }],
                field_rules: vec![FieldRule {
                    field: "ユーザーID".to_string(),
                    required: Requirement::Required,
                    data_type: String::new(),
                    max_length: "20".to_string(),
                    format: String::new(),
                }],
            },
        }
    }

    #[test]
    fn renders_template_sections() {
        let out = MarkdownRenderer.render(&sample()).unwrap();
        assert!(out.starts_with("# LGN_01 ログイン画面\n"));
        assert!(out.contains("| Ngày tạo | 2024-05-01 |"));
        assert!(out.contains("| Mô tả | - |"));
        assert!(out.contains("- [3. Interaction Flow](#3-interaction-flow)"));
        assert!(out.contains("## 2. Screen Detail\n\n### Main Components\n"));
        assert!(out.contains("| STT | Tên thành phần | Loại | Bắt buộc | Mặc định | Mô tả | Action |"));
        assert!(out.contains("1. **Action 1**: 押下 / Click X\n   - Chuyển màn hình: HOM_01\n   - Navigate to Y"));
        assert!(out.contains("- **HCK-001**: 必須入力です。"));
        assert!(out.contains("| ユーザーID | Bắt buộc<br>Độ dài tối đa: 20 |"));
    }

    #[test]
    fn item_row_uses_br_for_line_breaks() {
        let out = MarkdownRenderer.render(&sample()).unwrap();
        assert!(out.contains(
            "| 1 | ログイン<br>Login | ボタン | - | - | Shows the name. | Click X<br>=====<br>Navigate to Y |"
        ));
    }

    #[test]
    fn cell_escapes_bare_pipes_only() {
        assert_eq!(cell("a|b"), r"a\|b");
        assert_eq!(cell(r"a\|b"), r"a\|b");
        assert_eq!(cell("||"), r"\|\|");
        assert_eq!(cell("  "), "-");
    }

    #[test]
    fn cell_keeps_inner_whitespace() {
        assert_eq!(cell("a  \n  b"), "a  <br>  b");
        assert_eq!(cell("a\r\nb"), "a<br>b");
    }

    #[test]
    fn no_action_renders_sentinel() {
        let mut doc = sample();
        doc.groups[0].items[0].action = ActionText::NoAction;
        let out = MarkdownRenderer.render(&doc).unwrap();
        assert!(out.contains("| Shows the name. | - |"));
    }
}
