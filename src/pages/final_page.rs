//! Closing page with book totals.

use super::{PageData, PageError, PageGenerator, PageOptions, PageType, page_number};
use crate::plural::{COUNTRIES, DAYS, Forms, PHOTOS, TRAVELS};
use async_trait::async_trait;
use maud::html;

pub struct FinalPage;

const CLOSING_QUOTE: (&str, &str) = (
    "Путешествие в тысячу ли начинается с первого шага.",
    "Лао-цзы",
);

#[async_trait(?Send)]
impl PageGenerator for FinalPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page: usize,
        _options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Book { meta, .. } = data else {
            return Err(PageError::MissingData {
                page: PageType::Final,
            });
        };
        let stats: [(u64, Forms); 4] = [
            (meta.travel_count as u64, TRAVELS),
            (meta.total_days as u64, DAYS),
            (meta.total_photos as u64, PHOTOS),
            (meta.country_count as u64, COUNTRIES),
        ];
        let (quote, author) = CLOSING_QUOTE;
        let markup = html! {
            section.pdf-page.final-page {
                h2 { "Спасибо за путешествие!" }
                p { "Пусть эта книга напоминает о самых тёплых эмоциях и помогает планировать новые приключения." }
                div.final-stats {
                    @for (n, forms) in stats {
                        @if n > 0 {
                            div.final-stat {
                                strong { (n) }
                                span { (forms.select(n)) }
                            }
                        }
                    }
                }
                p.final-quote { "«" (quote) "»" }
                p.final-quote-author { (author) }
                (page_number(page))
            }
        };
        Ok(markup.into_string())
    }

    fn estimate_page_count(&self, _data: &PageData<'_>, _options: &PageOptions<'_>) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::BookMeta;
    use crate::test_helpers::*;

    #[tokio::test]
    async fn totals_use_plural_forms() {
        let env = PageEnv::default();
        let meta = BookMeta {
            travel_count: 1,
            total_days: 22,
            total_photos: 0,
            country_count: 5,
            ..Default::default()
        };
        let html = FinalPage
            .generate(&PageData::Book { travels: &[], meta: &meta }, 20, &env.options())
            .await
            .unwrap();
        assert!(html.contains("<strong>1</strong><span>путешествие</span>"));
        assert!(html.contains("<strong>22</strong><span>дня</span>"));
        assert!(html.contains("<strong>5</strong><span>стран</span>"));
        assert!(!html.contains("фотограф"));
        assert_eq!(page_numbers(&html), vec![20]);
    }
}
