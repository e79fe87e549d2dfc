use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

#[derive(Debug, Clone, Default)]
pub struct FormatConfig {
    pub header: Option<String>,
    pub footer: Option<String>,
}

pub fn format_table<T: Tabled>(rows: impl IntoIterator<Item = T>, config: FormatConfig) -> Table {
    let mut table = Table::new(rows);
    if let Some(header) = config.header {
        table.with(Panel::header(header));
    }
    if let Some(footer) = config.footer {
        table.with(Panel::footer(footer));
    }

    table.with(Style::blank());
    table
}

/// Placeholder for missing cells.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        name: &'static str,
        size: u64,
    }

    #[test]
    fn test_table_with_panels() {
        let table = format_table(
            [Row { name: "release", size: 42 }],
            FormatConfig {
                header: Some("Catalogs".into()),
                footer: Some("1 cached".into()),
            },
        )
        .to_string();

        assert!(table.contains("Catalogs"));
        assert!(table.contains("release"));
        assert!(table.contains("42"));
        assert!(table.contains("1 cached"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash(None::<u64>), "-");
    }
}
