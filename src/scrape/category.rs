//! Best-effort sub-category label resolution.
//!
//! Report pages render their sub-categories as a row of buttons whose
//! `value` attribute carries the `subopcao` selector. Resolution is pure
//! metadata: it never fails the caller, it degrades to an empty label.

use crate::scrape::fetch::Fetcher;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Resolve the human-readable label for the `subopcao` selector embedded
/// in `url`, if any.
///
/// Returns an empty string when the URL carries no selector (no network
/// call is made), when the fetch fails, or when the page has no matching
/// button.
pub async fn resolve(fetcher: &Fetcher, url: &str) -> String {
    let value = match sub_option_value(url) {
        Some(value) => value,
        None => return String::new(),
    };
    match fetcher.fetch(url).await {
        Ok(html) => label_for(&html, &value).unwrap_or_default(),
        Err(err) => {
            debug!(url = %url, error = %err, "category fetch failed, using empty label");
            String::new()
        }
    }
}

/// The `subopcao` query parameter of `url`, if present.
fn sub_option_value(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "subopcao")
        .map(|(_, value)| value.into_owned())
}

/// Text of the button whose `value` attribute equals `value`.
fn label_for(html: &str, value: &str) -> Option<String> {
    let sel = Selector::parse(&format!(r#"button[value="{value}"]"#)).ok()?;
    let doc = Html::parse_document(html);
    doc.select(&sel).next().map(|el| {
        el.text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_option_value_parsed_from_query() {
        let url = "http://vitibrasil.cnpuv.embrapa.br/index.php?subopcao=subopt_02&opcao=opt_03&ano=2020";
        assert_eq!(sub_option_value(url).as_deref(), Some("subopt_02"));
    }

    #[test]
    fn test_no_sub_option_in_query() {
        let url = "http://vitibrasil.cnpuv.embrapa.br/index.php?opcao=opt_02&ano=2020";
        assert_eq!(sub_option_value(url), None);
    }

    #[test]
    fn test_label_for_matching_button() {
        let html = r#"
        <form>
          <button value="subopt_01">Viníferas</button>
          <button value="subopt_02">Americanas e híbridas</button>
        </form>
        "#;
        assert_eq!(label_for(html, "subopt_02").as_deref(), Some("Americanas e híbridas"));
    }

    #[test]
    fn test_label_missing_button() {
        assert_eq!(label_for("<form></form>", "subopt_09"), None);
    }

    #[tokio::test]
    async fn test_plain_url_resolves_empty_without_network() {
        // no subopcao parameter, so no fetch is attempted against the
        // (unroutable) host
        let fetcher = Fetcher::default();
        let label = resolve(&fetcher, "http://vitibrasil.invalid/index.php?opcao=opt_02&ano=2020").await;
        assert_eq!(label, "");
    }
}
