//! Rendering of a delta table into a webhook message.
//!
//! Text, markdown and template-card messages carry the same information: a
//! header with the category and delta size, a capped list of entries, and a
//! `... 共 N 条` line when the list was cut.

use crate::cli::MessageKind;
use crate::domain::constants::{
    FIELD_CHANGE, FIELD_HOLDER, FIELD_SECCODE, FIELD_SECNAME, FIELD_VARYDATE,
};
use crate::domain::models::{Category, FormatSettings, Record, Settings, Table};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msgtype", rename_all = "snake_case")]
pub enum Message {
    Text { text: TextContent },
    Markdown { markdown: TextContent },
    TemplateCard { template_card: TemplateCard },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateCard {
    pub card_type: String,
    pub main_title: MainTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_title_text: Option<String>,
    pub horizontal_content_list: Vec<HorizontalContent>,
    pub card_action: CardAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainTitle {
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizontalContent {
    pub keyname: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardAction {
    /// 1 opens `url`.
    #[serde(rename = "type")]
    pub action_type: u8,
    pub url: String,
}

impl Message {
    /// Plain-text view for terminals and logs.
    pub fn preview(&self) -> String {
        match self {
            Message::Text { text } => text.content.clone(),
            Message::Markdown { markdown } => markdown.content.clone(),
            Message::TemplateCard { template_card } => {
                let mut lines = vec![format!(
                    "{} {}",
                    template_card.main_title.title, template_card.main_title.desc
                )];
                for item in &template_card.horizontal_content_list {
                    lines.push(format!("{}: {}", item.keyname, item.value));
                }
                if let Some(sub) = &template_card.sub_title_text {
                    lines.push(sub.clone());
                }
                lines.push(template_card.card_action.url.clone());
                lines.join("\n")
            }
        }
    }
}

/// Display fields of one delta row, with fallbacks for missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub security: String,
    pub holder: String,
    pub change: String,
    pub date: String,
}

impl Entry {
    pub fn from_record(row: &Record) -> Self {
        Self {
            security: row
                .non_blank(FIELD_SECNAME)
                .or_else(|| row.non_blank(FIELD_SECCODE))
                .unwrap_or("未知")
                .to_string(),
            holder: row.non_blank(FIELD_HOLDER).unwrap_or("未知股东").to_string(),
            change: row.non_blank(FIELD_CHANGE).unwrap_or("N/A").to_string(),
            date: row.non_blank(FIELD_VARYDATE).unwrap_or("N/A").to_string(),
        }
    }
}

/// Replace line breaks and table pipes so a value stays on one line and in
/// one markdown cell.
pub fn sanitize(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .replace('|', "｜")
}

/// Keep at most `max_chars` characters, marking a cut with `…`.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars).collect();
    out.push('…');
    out
}

pub struct Formatter {
    kind: MessageKind,
    format: FormatSettings,
    card_url: String,
}

impl Formatter {
    pub fn new(kind: MessageKind, format: FormatSettings, card_url: impl Into<String>) -> Self {
        Self {
            kind,
            format,
            card_url: card_url.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.notify.kind,
            settings.format.clone(),
            settings.notify.card_url.clone(),
        )
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn render(&self, category: Category, delta: &Table) -> Message {
        match self.kind {
            MessageKind::Text => self.render_text(category, delta),
            MessageKind::Markdown => self.render_markdown(category, delta),
            MessageKind::Card => self.render_card(category, delta),
        }
    }

    fn compact_holder(&self, holder: &str) -> String {
        truncate_chars(&sanitize(holder), self.format.holder_max_chars)
    }

    fn render_text(&self, category: Category, delta: &Table) -> Message {
        let mut lines = vec![header(category, delta.len())];
        for row in delta.rows().iter().take(self.format.compact_cap) {
            let e = Entry::from_record(row);
            lines.push(format!(
                "• {} | {} | {}股 | {}",
                sanitize(&e.security),
                self.compact_holder(&e.holder),
                e.change,
                e.date
            ));
        }
        if let Some(total) = overflow_line(delta.len(), self.format.compact_cap) {
            lines.push(total);
        }
        Message::Text {
            text: TextContent {
                content: lines.join("\n"),
            },
        }
    }

    fn render_markdown(&self, category: Category, delta: &Table) -> Message {
        let mut lines = vec![
            format!("**{}**", header(category, delta.len())),
            String::new(),
            "| 证券 | 股东 | 变动数量(股) | 变动日期 |".to_string(),
            "| :--- | :--- | ---: | :--- |".to_string(),
        ];
        for row in delta.rows().iter().take(self.format.table_cap) {
            let e = Entry::from_record(row);
            lines.push(format!(
                "| {} | {} | {} | {} |",
                sanitize(&e.security),
                sanitize(&e.holder),
                sanitize(&e.change),
                sanitize(&e.date)
            ));
        }
        if let Some(total) = overflow_line(delta.len(), self.format.table_cap) {
            lines.push(String::new());
            lines.push(total);
        }
        Message::Markdown {
            markdown: TextContent {
                content: lines.join("\n"),
            },
        }
    }

    fn render_card(&self, category: Category, delta: &Table) -> Message {
        let horizontal_content_list = delta
            .rows()
            .iter()
            .take(self.format.compact_cap)
            .map(|row| {
                let e = Entry::from_record(row);
                HorizontalContent {
                    keyname: sanitize(&e.security),
                    value: format!(
                        "{} {}股 {}",
                        self.compact_holder(&e.holder),
                        e.change,
                        e.date
                    ),
                }
            })
            .collect();
        Message::TemplateCard {
            template_card: TemplateCard {
                card_type: "text_notice".to_string(),
                main_title: MainTitle {
                    title: format!("【{}】", category.title()),
                    desc: format!("发现 {} 条新记录", delta.len()),
                },
                sub_title_text: overflow_line(delta.len(), self.format.compact_cap),
                horizontal_content_list,
                card_action: CardAction {
                    action_type: 1,
                    url: self.card_url.clone(),
                },
            },
        }
    }
}

fn header(category: Category, count: usize) -> String {
    format!("【{}】发现 {} 条新记录", category.title(), count)
}

fn overflow_line(total: usize, cap: usize) -> Option<String> {
    (total > cap).then(|| format!("... 共 {} 条", total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: usize) -> Record {
        Record::from_iter([
            ("SECCODE".to_string(), format!("{:06}", i)),
            ("SECNAME".to_string(), format!("证券{}", i)),
            ("DECLAREDATE".to_string(), "2026-10-16".to_string()),
            ("VARYDATE".to_string(), "2026-10-15".to_string()),
            ("F002V".to_string(), format!("股东{}", i)),
            ("F004N".to_string(), format!("{}", i * 100)),
        ])
    }

    fn delta(n: usize) -> Table {
        (1..=n).map(row).collect()
    }

    fn formatter(kind: MessageKind) -> Formatter {
        Formatter::new(kind, FormatSettings::default(), "https://example.test/page")
    }

    fn content(message: &Message) -> &str {
        match message {
            Message::Text { text } => &text.content,
            Message::Markdown { markdown } => &markdown.content,
            Message::TemplateCard { .. } => panic!("card has no content"),
        }
    }

    #[test]
    fn text_lists_every_entry_under_the_cap() {
        let msg = formatter(MessageKind::Text).render(Category::IncDetail, &delta(2));
        let text = content(&msg);
        assert_eq!(
            text,
            "【增持明细】发现 2 条新记录\n\
             • 证券1 | 股东1 | 100股 | 2026-10-15\n\
             • 证券2 | 股东2 | 200股 | 2026-10-15"
        );
    }

    #[test]
    fn text_caps_entries_and_states_the_total() {
        let msg = formatter(MessageKind::Text).render(Category::DescDetail, &delta(7));
        let text = content(&msg);
        assert!(text.starts_with("【减持明细】发现 7 条新记录"));
        assert_eq!(text.matches('•').count(), 5);
        assert!(text.ends_with("... 共 7 条"));
    }

    #[test]
    fn markdown_uses_the_table_cap() {
        let msg = formatter(MessageKind::Markdown).render(Category::IncSummary, &delta(10));
        let text = content(&msg);
        assert!(text.starts_with("**【增持汇总】发现 10 条新记录**"));
        assert_eq!(text.lines().filter(|l| l.starts_with("| 证券")).count(), 1);
        assert!(text.contains("| 证券8 |"));
        assert!(!text.contains("| 证券9 |"));
        assert!(text.ends_with("... 共 10 条"));
    }

    #[test]
    fn holder_is_sanitized_and_truncated_in_compact_formats() {
        let mut r = row(1);
        r.insert("F002V", "第一行\r\n第二行|某某投资管理有限公司资产管理计划");
        let table: Table = vec![r].into_iter().collect();

        let text = formatter(MessageKind::Text).render(Category::IncDetail, &table);
        let line = content(&text).lines().nth(1).unwrap().to_string();
        assert!(line.contains("| 第一行 第二行｜某某投资管理有限… |"));

        let md = formatter(MessageKind::Markdown).render(Category::IncDetail, &table);
        assert!(content(&md).contains("| 第一行 第二行｜某某投资管理有限公司资产管理计划 |"));
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let table: Table = vec![Record::from_iter([("SECCODE", "000001")])]
            .into_iter()
            .collect();
        let msg = formatter(MessageKind::Text).render(Category::IncDetail, &table);
        assert!(content(&msg).contains("• 000001 | 未知股东 | N/A股 | N/A"));

        let anonymous: Table = vec![Record::from_iter([("F002V", "张三")])]
            .into_iter()
            .collect();
        let msg = formatter(MessageKind::Text).render(Category::IncDetail, &anonymous);
        assert!(content(&msg).contains("• 未知 | 张三 |"));
    }

    #[test]
    fn card_payload_matches_webhook_shape() {
        let msg = formatter(MessageKind::Card).render(Category::DescSummary, &delta(6));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["msgtype"], "template_card");
        let card = &json["template_card"];
        assert_eq!(card["card_type"], "text_notice");
        assert_eq!(card["main_title"]["title"], "【减持汇总】");
        assert_eq!(card["main_title"]["desc"], "发现 6 条新记录");
        assert_eq!(card["horizontal_content_list"].as_array().unwrap().len(), 5);
        assert_eq!(card["horizontal_content_list"][0]["keyname"], "证券1");
        assert_eq!(card["horizontal_content_list"][0]["value"], "股东1 100股 2026-10-15");
        assert_eq!(card["sub_title_text"], "... 共 6 条");
        assert_eq!(card["card_action"]["type"], 1);
        assert_eq!(card["card_action"]["url"], "https://example.test/page");
    }

    #[test]
    fn card_without_overflow_omits_subtitle() {
        let msg = formatter(MessageKind::Card).render(Category::DescSummary, &delta(1));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["template_card"].get("sub_title_text").is_none());
    }

    #[test]
    fn text_and_markdown_payload_shapes() {
        let text = formatter(MessageKind::Text).render(Category::IncDetail, &delta(1));
        let text = serde_json::to_value(text).unwrap();
        assert_eq!(text["msgtype"], "text");
        assert!(text["text"]["content"].as_str().unwrap().contains("证券1"));

        let md = formatter(MessageKind::Markdown).render(Category::IncDetail, &delta(1));
        let md = serde_json::to_value(md).unwrap();
        assert_eq!(md["msgtype"], "markdown");
        assert!(md["markdown"]["content"].as_str().unwrap().contains("证券1"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("中文名称", 2), "中文…");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
