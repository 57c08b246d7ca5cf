//! The transformation pipeline: locate, parse, index, enrich, assemble, validate.

use crate::assemble::{assemble, AssembleContext};
use crate::config::{Config, Patterns};
use crate::enrich::enrich;
use crate::error::{ConfigError, PipelineError};
use crate::index::ActionIndex;
use crate::model::{OutputDocument, RawDocument, Violation};
use crate::parser;
use crate::validate::validate;

/// A configured pipeline. Holds no per-document state, so one instance can
/// run any number of documents.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    patterns: Patterns,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let patterns = Patterns::compile(&config.patterns)?;
        Ok(Self { config, patterns })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transform one raw document. Fails on the first structural error, or
    /// with every violation when the assembled document does not validate.
    pub fn run(&self, text: &str) -> Result<OutputDocument, PipelineError> {
        let raw = RawDocument::new(text);
        let parsed = parser::parse(&raw)?;
        let index = ActionIndex::build(parsed.actions)?;
        tracing::debug!(actions = index.len(), "built action index");

        let items = enrich(parsed.items, &index)?;
        let ctx = AssembleContext {
            raw: &raw,
            config: &self.config,
            patterns: &self.patterns,
        };
        let doc = assemble(&parsed.overview, items, &index, &ctx);
        tracing::debug!(
            groups = doc.groups.len(),
            error_codes = doc.rules.error_codes.len(),
            "assembled document"
        );

        let violations = validate(&raw, &doc, &self.patterns);
        if !violations.is_empty() {
            return Err(PipelineError::Validation(violations));
        }
        Ok(doc)
    }

    /// Re-check an output document against its source.
    pub fn validate(&self, text: &str, doc: &OutputDocument) -> Vec<Violation> {
        validate(&RawDocument::new(text), doc, &self.patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionText, GroupKind, SectionKind};

    fn pipeline() -> Pipeline {
        Pipeline::new(Config::default()).unwrap()
    }

    const LOGIN: &str = "\
# LGN_01 ログイン画面

## 概要 / Overview
ユーザーIDとパスワードでログインする。

## 項目定義 / Item Definition
| No | 項目名 | Item Name | 種別 | 必須 | 説明 | Description |
|---|---|---|---|---|---|---|
| 1 | ユーザーID | User ID | テキスト | ○ | 未入力の場合HCK-001を表示する。 | Shows HCK-001 when empty. |
| 2 | ログイン | Login | ボタン | | アクションID 1を参照。 | Refer to action ID 1. |
| 3 | 確認 | Confirm | ボタン | | アクションID 2を参照。 | See action #2. |

## アクション / Actions
| ID | トリガー | Trigger | 画面遷移 | アクション詳細 | Action Detail |
|---|---|---|---|---|---|
| 1 | ログインボタン押下 | Click X | HOM_01 | 認証する | Navigate to Y |
| 2 | 確認ボタン押下 | Click confirm | 確認ダイアログ | ダイアログ表示 | Show dialog |
";

    #[test]
    fn resolves_back_reference_to_exact_action_text() {
        let text = "\
## Item Definition
| No | Item Name | Description |
|---|---|---|
| 1 | Name | Shows the name. Refer to action ID 1. |
## Actions
| ID | Trigger | Action Detail |
|---|---|---|
| 1 | Click X | Navigate to Y |
";
        let doc = pipeline().run(text).unwrap();
        let item = doc.items().next().unwrap();
        assert_eq!(item.action.as_str(), "Click X\n=====\nNavigate to Y");
        assert_eq!(item.description_en, "Shows the name.");
    }

    #[test]
    fn reference_inside_longer_sentence_validates_cleanly() {
        let text = "\
## Item Definition
| No | Item Name | Description |
|---|---|---|
| 1 | Name | Input field. For behaviour on tap, refer to action ID 1. |
| 2 | Hint | Shows a hint. See action notes in the appendix. |
## Actions
| ID | Trigger | Action Detail |
|---|---|---|
| 1 | Click X | Navigate to Y |
";
        let p = pipeline();
        let doc = p.run(text).unwrap();
        let items: Vec<_> = doc.items().collect();
        assert_eq!(items[0].description_en, "Input field.");
        assert_eq!(items[0].action.as_str(), "Click X\n=====\nNavigate to Y");
        assert_eq!(
            items[1].description_en,
            "Shows a hint. See action notes in the appendix."
        );
        assert_eq!(items[1].action, ActionText::NoAction);
        assert!(p.validate(text, &doc).is_empty());
    }

    #[test]
    fn item_without_reference_gets_sentinel() {
        let doc = pipeline().run(LOGIN).unwrap();
        let first = doc.items().next().unwrap();
        assert_eq!(first.action, ActionText::NoAction);
        assert_eq!(first.action.as_str(), "-");
        assert_eq!(first.description_ja, "未入力の場合HCK-001を表示する。");
    }

    #[test]
    fn duplicate_action_id_aborts() {
        let text = LOGIN.replace("| 2 | 確認ボタン押下", "| 1 | 確認ボタン押下");
        let err = pipeline().run(&text).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateActionId(ref id) if id == "1"));
    }

    #[test]
    fn unknown_action_id_aborts() {
        let text = LOGIN.replace("Refer to action ID 1.", "Refer to action ID 9.");
        let err = pipeline().run(&text).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnresolvedActionReference { ref id, .. } if id == "9"
        ));
    }

    #[test]
    fn blank_required_cell_is_forward_filled() {
        let doc = pipeline().run(LOGIN).unwrap();
        let login = doc.items().find(|i| i.row.item_number == "2").unwrap();
        assert_eq!(login.row.required_raw, "○");
    }

    #[test]
    fn mutated_output_reports_dropped_error_code() {
        let p = pipeline();
        let mut doc = p.run(LOGIN).unwrap();
        doc.rules.error_codes.retain(|e| e.code != "HCK-001");
        let violations = p.validate(LOGIN, &doc);
        assert!(violations
            .iter()
            .any(|v| v.to_string().contains("HCK-001")));
    }

    #[test]
    fn assembles_login_screen() {
        let doc = pipeline().run(LOGIN).unwrap();
        assert_eq!(doc.metadata.screen_code.as_deref(), Some("LGN_01"));
        assert_eq!(doc.metadata.screen_name.as_deref(), Some("ログイン画面"));
        assert_eq!(doc.overview, "ユーザーIDとパスワードでログインする。");

        assert_eq!(doc.groups.len(), 2);
        assert_eq!(doc.groups[0].kind, GroupKind::MainComponents);
        assert_eq!(doc.groups[1].kind, GroupKind::Popups);
        assert_eq!(doc.groups[1].items[0].row.item_number, "3");

        let login = &doc.groups[0].items[1];
        assert_eq!(
            login.action.as_str(),
            "ログインボタン押下\nClick X\n=====\n認証する\nNavigate to Y"
        );
        assert_eq!(login.description_ja, "");
        assert_eq!(login.description_en, "");

        let codes: Vec<_> = doc.rules.error_codes.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["HCK-001"]);
        assert_eq!(doc.flow.len(), 2);
    }

    #[test]
    fn output_is_deterministic() {
        let p = pipeline();
        assert_eq!(p.run(LOGIN).unwrap(), p.run(LOGIN).unwrap());
    }

    #[test]
    fn revalidating_output_finds_nothing() {
        let p = pipeline();
        let doc = p.run(LOGIN).unwrap();
        assert!(p.validate(LOGIN, &doc).is_empty());
        assert!(p.validate(LOGIN, &doc).is_empty());
    }

    #[test]
    fn missing_action_table_is_reported() {
        let text = "## 項目定義\n| No |\n|---|\n| 1 |\n";
        assert!(matches!(
            pipeline().run(text).unwrap_err(),
            PipelineError::SectionNotFound(SectionKind::ActionTable)
        ));
    }

    #[test]
    fn injected_metadata_wins() {
        let config = Config::from_toml(
            "[metadata]\nscreen_name = \"Custom\"\nversion = \"2.1\"\ncreated = \"2024-01-31\"\n",
        )
        .unwrap();
        let doc = Pipeline::new(config).unwrap().run(LOGIN).unwrap();
        assert_eq!(doc.metadata.screen_code.as_deref(), Some("LGN_01"));
        assert_eq!(doc.metadata.screen_name.as_deref(), Some("Custom"));
        assert_eq!(doc.metadata.version, "2.1");
        assert_eq!(
            doc.metadata.created,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(doc.metadata.updated, None);
    }
}
