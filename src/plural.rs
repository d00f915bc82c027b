//! Slavic plural selection for count labels.
//!
//! Russian picks one of three noun forms from the last one or two digits:
//!
//! | Form | Rule | Examples |
//! |------|------|----------|
//! | `One` | last digit 1, except 11 | 1, 21, 101 |
//! | `Few` | last digit 2-4, except 12-14 | 2, 3, 24 |
//! | `Many` | everything else | 0, 5, 11, 12, 25 |
//!
//! The rules are data ([`RULES`]) evaluated in order; the first match wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralForm {
    One,
    Few,
    Many,
}

struct Rule {
    form: PluralForm,
    last_digit: &'static [u64],
    except_last_two: &'static [u64],
}

const RULES: [Rule; 2] = [
    Rule {
        form: PluralForm::One,
        last_digit: &[1],
        except_last_two: &[11],
    },
    Rule {
        form: PluralForm::Few,
        last_digit: &[2, 3, 4],
        except_last_two: &[12, 13, 14],
    },
];

pub fn plural_form(n: u64) -> PluralForm {
    let last = n % 10;
    let last_two = n % 100;
    RULES
        .iter()
        .find(|r| r.last_digit.contains(&last) && !r.except_last_two.contains(&last_two))
        .map(|r| r.form)
        .unwrap_or(PluralForm::Many)
}

/// Three noun forms for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forms {
    pub one: &'static str,
    pub few: &'static str,
    pub many: &'static str,
}

impl Forms {
    pub const fn new(one: &'static str, few: &'static str, many: &'static str) -> Self {
        Self { one, few, many }
    }

    pub fn select(&self, n: u64) -> &'static str {
        match plural_form(n) {
            PluralForm::One => self.one,
            PluralForm::Few => self.few,
            PluralForm::Many => self.many,
        }
    }

    /// `"21 день"`, `"3 фото"`.
    pub fn count(&self, n: u64) -> String {
        format!("{n} {}", self.select(n))
    }
}

pub const DAYS: Forms = Forms::new("день", "дня", "дней");
pub const PHOTOS: Forms = Forms::new("фотография", "фотографии", "фотографий");
pub const TRAVELS: Forms = Forms::new("путешествие", "путешествия", "путешествий");
pub const ITEMS: Forms = Forms::new("пункт", "пункта", "пунктов");
pub const PLACES: Forms = Forms::new("место", "места", "мест");
pub const COUNTRIES: Forms = Forms::new("страна", "страны", "стран");

/// Day-count label; zero days has no label at all.
pub fn format_days(days: u32) -> Option<String> {
    (days > 0).then(|| DAYS.count(days as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_labels_follow_slavic_rules() {
        assert_eq!(DAYS.count(1), "1 день");
        assert_eq!(DAYS.count(2), "2 дня");
        assert_eq!(DAYS.count(5), "5 дней");
        assert_eq!(DAYS.count(21), "21 день");
        assert_eq!(DAYS.count(25), "25 дней");
    }

    #[test]
    fn teens_are_many() {
        for n in 11..=14 {
            assert_eq!(plural_form(n), PluralForm::Many, "n = {n}");
        }
        assert_eq!(plural_form(111), PluralForm::Many);
        assert_eq!(plural_form(112), PluralForm::Many);
    }

    #[test]
    fn few_and_one_in_larger_numbers() {
        assert_eq!(plural_form(22), PluralForm::Few);
        assert_eq!(plural_form(104), PluralForm::Few);
        assert_eq!(plural_form(101), PluralForm::One);
        assert_eq!(plural_form(0), PluralForm::Many);
    }

    #[test]
    fn zero_days_has_no_label() {
        assert_eq!(format_days(0), None);
        assert_eq!(format_days(3).as_deref(), Some("3 дня"));
    }

    #[test]
    fn photo_and_item_forms() {
        assert_eq!(PHOTOS.count(1), "1 фотография");
        assert_eq!(PHOTOS.count(12), "12 фотографий");
        assert_eq!(ITEMS.count(3), "3 пункта");
        assert_eq!(TRAVELS.count(5), "5 путешествий");
    }
}
