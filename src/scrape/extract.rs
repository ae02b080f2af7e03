//! Pure HTML extraction for report pages.
//!
//! No network, no storage: a function of the input document. The data
//! table is located by its fixed structural marker, never by position.

use crate::error::ExtractError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// CSS marker identifying the data table on every report page.
pub const DATA_TABLE_SELECTOR: &str = "table.tb_base.tb_dados";

/// The data table of a report page: the header row's cells plus every
/// subsequent row whose width matches it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Structured content of a single report page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExtract {
    /// Text of every `h1`..`h6` element, document order.
    pub headings: Vec<String>,
    /// Text of every `p` element, document order.
    pub paragraphs: Vec<String>,
    pub table: DataTable,
}

/// Extract headings, paragraphs and the data table from a report page.
///
/// Fails with [`ExtractError::TableMissing`] when the page carries no
/// data table marker; a present table with zero data rows is a valid
/// (empty) result, not an error.
pub fn extract(html: &str) -> Result<PageExtract, ExtractError> {
    let doc = Html::parse_document(html);
    Ok(PageExtract {
        headings: select_texts(&doc, "h1, h2, h3, h4, h5, h6"),
        paragraphs: select_texts(&doc, "p"),
        table: extract_table(&doc)?,
    })
}

fn extract_table(doc: &Html) -> Result<DataTable, ExtractError> {
    let table_sel = Selector::parse(DATA_TABLE_SELECTOR).unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let header_cell_sel = Selector::parse("th, td").unwrap();
    let data_cell_sel = Selector::parse("td").unwrap();

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or(ExtractError::TableMissing)?;

    let mut rows_iter = table.select(&row_sel);
    let columns: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .select(&header_cell_sel)
            .map(|cell| element_text(&cell))
            .collect(),
        None => Vec::new(),
    };

    // Data rows read td cells only; rows of any other width are dropped,
    // not coerced to fit.
    let mut rows = Vec::new();
    for tr in rows_iter {
        let cells: Vec<String> = tr
            .select(&data_cell_sel)
            .map(|cell| element_text(&cell))
            .collect();
        if cells.len() == columns.len() {
            rows.push(cells);
        }
    }

    Ok(DataTable { columns, rows })
}

fn select_texts(doc: &Html, selector: &str) -> Vec<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel).map(|el| element_text(&el)).collect()
}

/// Whitespace-normalized text content of an element.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html><body>
      <h1>Banco de dados de uva, vinho e derivados</h1>
      <div><h3>Produção de vinhos e derivados</h3></div>
      <p>Dados da vitivinicultura do Rio Grande do Sul.</p>
      <p>Atualização anual.</p>
      <table class="tb_base tb_dados">
        <tr><th>Produto</th><th>Quantidade (L.)</th></tr>
        <tr><td>  VINHO DE MESA  </td><td>169.762.429</td></tr>
        <tr><td>Tinto</td><td>139.320.884</td></tr>
        <tr><td>orphan cell</td></tr>
        <tr><td>Branco</td><td>27.910.299</td></tr>
      </table>
    </body></html>
    "#;

    #[test]
    fn test_headings_in_document_order() {
        let page = extract(PAGE).unwrap();
        assert_eq!(
            page.headings,
            vec![
                "Banco de dados de uva, vinho e derivados",
                "Produção de vinhos e derivados"
            ]
        );
    }

    #[test]
    fn test_paragraphs_in_document_order() {
        let page = extract(PAGE).unwrap();
        assert_eq!(
            page.paragraphs,
            vec![
                "Dados da vitivinicultura do Rio Grande do Sul.",
                "Atualização anual."
            ]
        );
    }

    #[test]
    fn test_table_header_row_and_width_filter() {
        let page = extract(PAGE).unwrap();
        assert_eq!(page.table.columns, vec!["Produto", "Quantidade (L.)"]);
        // the 1-cell row is dropped, not padded
        assert_eq!(page.table.rows.len(), 3);
        for row in &page.table.rows {
            assert_eq!(row.len(), page.table.columns.len());
        }
        assert_eq!(page.table.rows[0], vec!["VINHO DE MESA", "169.762.429"]);
    }

    #[test]
    fn test_mismatched_rows_dropped_three_column_example() {
        let html = r#"
        <table class="tb_base tb_dados">
          <tr><th>Produto</th><th>Quantidade</th><th>Unidade</th></tr>
          <tr><td>a</td><td>1</td><td>L.</td></tr>
          <tr><td>b</td><td>2</td><td>L.</td></tr>
          <tr><td>c</td><td>3</td><td>L.</td></tr>
          <tr><td>d</td><td>4</td><td>L.</td></tr>
          <tr><td>e</td><td>5</td><td>L.</td></tr>
          <tr><td>malformed</td><td>6</td></tr>
        </table>
        "#;
        let page = extract(html).unwrap();
        assert_eq!(page.table.rows.len(), 5);
        assert!(page.table.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_missing_table_is_an_error_not_empty() {
        let err = extract("<html><body><p>no table here</p></body></html>").unwrap_err();
        assert_eq!(err, ExtractError::TableMissing);
    }

    #[test]
    fn test_wrong_table_class_does_not_match() {
        let html = r#"<table class="tb_base"><tr><th>x</th></tr></table>"#;
        assert_eq!(extract(html).unwrap_err(), ExtractError::TableMissing);
    }

    #[test]
    fn test_table_with_only_header_row_yields_zero_rows() {
        let html = r#"
        <table class="tb_base tb_dados">
          <tr><th>Produto</th><th>Quantidade</th></tr>
        </table>
        "#;
        let page = extract(html).unwrap();
        assert_eq!(page.table.columns.len(), 2);
        assert!(page.table.rows.is_empty());
    }

    #[test]
    fn test_cell_text_is_whitespace_normalized() {
        let html = "<table class=\"tb_base tb_dados\">
          <tr><th>Produto</th></tr>
          <tr><td>\n   VINHO \n FINO   </td></tr>
        </table>";
        let page = extract(html).unwrap();
        assert_eq!(page.table.rows[0][0], "VINHO FINO");
    }
}
