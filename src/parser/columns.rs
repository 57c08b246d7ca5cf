//! Header-driven column binding.
//!
//! Header tokens are normalized and matched against ordered synonym lists per
//! logical field. Each field binds to at most one column; columns nothing
//! claims are ignored so extra source columns do not break parsing.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Number,
    NameJa,
    NameEn,
    ItemType,
    Required,
    DataType,
    MaxLength,
    Format,
    InitialValue,
    DescriptionJa,
    DescriptionEn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionField {
    Id,
    TriggerJa,
    TriggerEn,
    ScreenTransition,
    DetailJa,
    DetailEn,
    Remarks,
}

/// Logical fields of one table kind, in binding priority order.
pub struct ColumnSpec<F: 'static> {
    pub fields: &'static [(F, &'static [&'static str])],
    /// Field that must bind for the table to be usable.
    pub id: F,
}

pub static ITEM_COLUMNS: ColumnSpec<ItemField> = ColumnSpec {
    id: ItemField::Number,
    fields: &[
        (
            ItemField::Number,
            &["no", "no.", "#", "項番", "番号", "項目no", "項目no.", "itemno", "itemno.", "stt", "number"],
        ),
        (
            ItemField::NameJa,
            &[
                "項目名", "項目名(日本語)", "項目名(jp)", "項目名(ja)", "名称", "論理名",
                "itemname(jp)", "itemname(ja)", "name(jp)", "name(ja)",
            ],
        ),
        (
            ItemField::NameEn,
            &[
                "項目名(英語)", "項目名(en)", "英語名", "名称(英語)", "itemname(en)", "name(en)",
                "itemname", "name", "englishname",
            ],
        ),
        (
            ItemField::ItemType,
            &["項目種別", "種別", "項目タイプ", "タイプ", "コントロール", "itemtype", "type", "controltype", "component"],
        ),
        (
            ItemField::Required,
            &["必須", "必須区分", "必須/任意", "必須有無", "required", "mandatory", "isrequired"],
        ),
        (
            ItemField::DataType,
            &["データ型", "データタイプ", "型", "属性", "datatype"],
        ),
        (
            ItemField::MaxLength,
            &["最大桁数", "桁数", "最大文字数", "文字数", "最大長", "maxlength", "maxlen", "length"],
        ),
        (ItemField::Format, &["フォーマット", "書式", "形式", "format"]),
        (
            ItemField::InitialValue,
            &["初期値", "初期表示", "デフォルト値", "initialvalue", "defaultvalue", "default"],
        ),
        (
            ItemField::DescriptionJa,
            &[
                "説明", "説明(日本語)", "説明(jp)", "説明(ja)", "内容", "詳細", "備考",
                "description(jp)", "description(ja)",
            ],
        ),
        (
            ItemField::DescriptionEn,
            &["説明(英語)", "説明(en)", "備考(英語)", "description(en)", "description", "desc", "remarks"],
        ),
    ],
};

pub static ACTION_COLUMNS: ColumnSpec<ActionField> = ColumnSpec {
    id: ActionField::Id,
    fields: &[
        (
            ActionField::Id,
            &["id", "no", "no.", "#", "アクションid", "アクションno", "アクションno.", "actionid", "項番", "番号"],
        ),
        (
            ActionField::TriggerJa,
            &["トリガー", "トリガー(日本語)", "トリガー(jp)", "トリガー(ja)", "イベント", "契機", "操作", "trigger(jp)", "trigger(ja)"],
        ),
        (
            ActionField::TriggerEn,
            &["トリガー(英語)", "トリガー(en)", "イベント(英語)", "trigger(en)", "trigger", "event"],
        ),
        (
            ActionField::ScreenTransition,
            &["画面遷移", "遷移先", "遷移先画面", "遷移", "screentransition", "transition", "destination", "nextscreen"],
        ),
        (
            ActionField::DetailJa,
            &[
                "アクション詳細", "アクション詳細(日本語)", "アクション詳細(jp)", "アクション", "アクション内容",
                "処理内容", "処理詳細", "処理", "actiondetail(jp)", "actiondetail(ja)", "action(jp)",
            ],
        ),
        (
            ActionField::DetailEn,
            &[
                "アクション詳細(英語)", "アクション詳細(en)", "処理内容(英語)", "actiondetail(en)", "action(en)",
                "actiondetail", "action", "details", "detail",
            ],
        ),
        (ActionField::Remarks, &["備考", "remarks", "remark", "note", "notes", "メモ"]),
    ],
};

/// Lowercase, drop whitespace and emphasis, fold full-width punctuation.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '*' | '`' | '_'))
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            '／' => '/',
            '．' => '.',
            '＃' => '#',
            c => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Candidate spellings of one header: the whole token, then each part of a
/// bilingual `項目名<br>Item Name` or `項目名 / Item Name` header.
fn candidates(header: &str) -> Vec<String> {
    let whole = normalize_header(header);
    let mut out = vec![whole.clone()];
    for sep in ["<br>", "<br/>", "/", "\n"] {
        if whole.contains(sep) {
            out.extend(
                whole
                    .split(sep)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            );
        }
    }
    out
}

/// Field → column index.
#[derive(Debug, Clone)]
pub struct ColumnMap<F> {
    columns: HashMap<F, usize>,
}

impl<F: Copy + Eq + Hash> ColumnMap<F> {
    pub fn get(&self, field: F) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Cell for `field` in `row`, or `""` when the column is absent.
    pub fn cell<'a>(&self, row: &'a [String], field: F) -> &'a str {
        self.get(field)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Bind header tokens to fields. Fails when the id field finds no column.
pub fn bind<F>(headers: &[String], spec: &ColumnSpec<F>) -> Result<ColumnMap<F>, String>
where
    F: Copy + Eq + Hash + std::fmt::Debug,
{
    let mut columns: HashMap<F, usize> = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        let bound = candidates(header).iter().find_map(|candidate| {
            spec.fields
                .iter()
                .find(|(field, synonyms)| {
                    !columns.contains_key(field) && synonyms.contains(&candidate.as_str())
                })
                .map(|(field, _)| *field)
        });
        match bound {
            Some(field) => {
                columns.insert(field, i);
            }
            None => tracing::debug!(header = %header, "ignoring unrecognized column"),
        }
    }
    if !columns.contains_key(&spec.id) {
        return Err(format!(
            "no column for {:?} among headers [{}]",
            spec.id,
            headers.join(", ")
        ));
    }
    Ok(ColumnMap { columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_folds_width_and_case() {
        assert_eq!(normalize_header(" 項目名（英語） "), "項目名(英語)");
        assert_eq!(normalize_header("**Item Name**"), "itemname");
        assert_eq!(normalize_header("Max Length"), "maxlength");
    }

    #[test]
    fn binds_japanese_headers() {
        let map = bind(
            &headers(&["項番", "項目名", "項目名（英語）", "種別", "必須", "説明", "説明（英語）"]),
            &ITEM_COLUMNS,
        )
        .unwrap();
        assert_eq!(map.get(ItemField::Number), Some(0));
        assert_eq!(map.get(ItemField::NameJa), Some(1));
        assert_eq!(map.get(ItemField::NameEn), Some(2));
        assert_eq!(map.get(ItemField::ItemType), Some(3));
        assert_eq!(map.get(ItemField::Required), Some(4));
        assert_eq!(map.get(ItemField::DescriptionJa), Some(5));
        assert_eq!(map.get(ItemField::DescriptionEn), Some(6));
        assert_eq!(map.get(ItemField::Format), None);
    }

    #[test]
    fn binds_english_headers_and_ignores_extras() {
        let map = bind(
            &headers(&["ID", "Trigger", "Screen Transition", "Action Detail", "Owner", "Remarks"]),
            &ACTION_COLUMNS,
        )
        .unwrap();
        assert_eq!(map.get(ActionField::Id), Some(0));
        assert_eq!(map.get(ActionField::TriggerEn), Some(1));
        assert_eq!(map.get(ActionField::ScreenTransition), Some(2));
        assert_eq!(map.get(ActionField::DetailEn), Some(3));
        assert_eq!(map.get(ActionField::Remarks), Some(5));
        assert_eq!(map.get(ActionField::TriggerJa), None);
    }

    #[test]
    fn bilingual_header_binds_first_part() {
        let map = bind(&headers(&["No", "項目名<br>Item Name"]), &ITEM_COLUMNS).unwrap();
        assert_eq!(map.get(ItemField::NameJa), Some(1));
    }

    #[test]
    fn field_binds_once() {
        let map = bind(&headers(&["No", "説明", "備考"]), &ITEM_COLUMNS).unwrap();
        assert_eq!(map.get(ItemField::DescriptionJa), Some(1));
    }

    #[test]
    fn missing_id_column_fails() {
        let err = bind(&headers(&["項目名", "説明"]), &ITEM_COLUMNS).unwrap_err();
        assert!(err.contains("Number"));
    }

    #[test]
    fn cell_defaults_to_empty() {
        let map = bind(&headers(&["No"]), &ITEM_COLUMNS).unwrap();
        let row = vec!["1".to_string()];
        assert_eq!(map.cell(&row, ItemField::Number), "1");
        assert_eq!(map.cell(&row, ItemField::NameJa), "");
    }
}
