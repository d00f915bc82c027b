//! Printable packing checklists, one page per section.

use super::{
    PageData, PageError, PageGenerator, PageOptions, PageType, book_title, page_number,
    running_header,
};
use crate::config::ChecklistSection;
use crate::plural::ITEMS;
use async_trait::async_trait;
use maud::html;

pub struct ChecklistPage;

pub fn items(section: ChecklistSection) -> &'static [&'static str] {
    match section {
        ChecklistSection::Clothing => &[
            "Термобельё",
            "Тёплый слой/флис",
            "Дождевик/пончо",
            "Треккинговая обувь",
            "Шапка, перчатки, бафф",
        ],
        ChecklistSection::Food => &[
            "Перекусы",
            "Термос",
            "Походная посуда",
            "Мультитул/нож",
            "Фильтр или запас воды",
        ],
        ChecklistSection::Electronics => &[
            "Повербанк",
            "Камера/GoPro",
            "Переходники",
            "Налобный фонарь",
            "Запасные карты памяти",
        ],
        ChecklistSection::Documents => &[
            "Паспорт",
            "Билеты/бронирования",
            "Страховка",
            "Водительские права",
            "Список контактов",
        ],
        ChecklistSection::Medicine => &[
            "Индивидуальные лекарства",
            "Пластыри и бинт",
            "Средство от насекомых",
            "Солнцезащита",
            "Антисептик",
        ],
    }
}

#[async_trait(?Send)]
impl PageGenerator for ChecklistPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Checklist(section) = data else {
            return Err(PageError::MissingData {
                page: PageType::Checklist,
            });
        };
        let items = items(*section);
        let markup = html! {
            section.pdf-page.checklist-page {
                (running_header(book_title(options.settings), "Чек-лист"))
                h2 { "Чек-лист: " (section.label()) }
                p.checklist-count { (ITEMS.count(items.len() as u64)) }
                ul.checklist {
                    @for item in items {
                        li.checklist-item {
                            span.checkbox {}
                            span { (item) }
                        }
                    }
                }
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
    use crate::test_helpers::*;

    #[tokio::test]
    async fn section_page_lists_its_items() {
        let env = PageEnv::default();
        let html = ChecklistPage
            .generate(&PageData::Checklist(ChecklistSection::Electronics), 12, &env.options())
            .await
            .unwrap();
        assert_eq!(count_pages(&html), 1);
        assert!(html.contains("Чек-лист: Электроника"));
        assert!(html.contains("Повербанк"));
        assert!(!html.contains("Паспорт"));
        assert!(html.contains("5 пунктов"));
        assert_eq!(html.matches(r#"<span class="checkbox">"#).count(), 5);
        assert_eq!(page_numbers(&html), vec![12]);
    }

    #[test]
    fn every_section_has_items() {
        for section in ChecklistSection::ALL {
            assert!(!items(section).is_empty(), "{section:?}");
        }
    }
}
