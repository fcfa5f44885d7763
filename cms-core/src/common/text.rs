use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SLUG_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid regex")
});

/// Splits a comma-separated field into trimmed, non-empty entries.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits free text into paragraphs on blank lines.
pub fn split_paragraphs(value: &str) -> Vec<String> {
    value
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'a',
        'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'o',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'Ñ' => 'n',
        'Ç' => 'c',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}

/// URL slug: accents folded to ASCII, lowercased, punctuation dropped, runs of
/// whitespace and dashes collapsed to a single dash.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.chars().filter_map(fold_accent).collect();
    let lowered = ascii.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let dashed = SLUG_DASHES.replace_all(stripped.trim(), "-");
    dashed.trim_matches(|c| c == '-' || c == '_').to_string()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `21 de septiembre, 2024`
pub fn spanish_long_date(date: NaiveDate) -> String {
    let month = SPANISH_MONTHS[date.month0() as usize];
    format!("{} de {}, {}", date.day(), month, date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_fields_drop_blank_entries() {
        assert_eq!(
            split_csv(" Sin comisión , ,Tarjeta gratis,"),
            vec!["Sin comisión".to_string(), "Tarjeta gratis".to_string()]
        );
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let paragraphs = split_paragraphs("Primero.\n\nSegundo\ncontinúa.\n\n\n\n");
        assert_eq!(paragraphs, vec!["Primero.", "Segundo\ncontinúa."]);
    }

    #[test]
    fn slugify_folds_spanish_titles() {
        assert_eq!(slugify("Cuenta de Ahorro Clásica"), "cuenta-de-ahorro-clasica");
        assert_eq!(slugify("  Préstamo -- Hipotecario! "), "prestamo-hipotecario");
        assert_eq!(slugify("Año 2024"), "ano-2024");
    }

    #[test]
    fn long_dates_use_spanish_month_names() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 21).unwrap();
        assert_eq!(spanish_long_date(date), "21 de septiembre, 2024");
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(spanish_long_date(date), "5 de enero, 2025");
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("cliente@asomap.com.do"));
        assert!(!is_valid_email("cliente@"));
        assert!(!is_valid_email("sin-arroba.com"));
        assert!(!is_valid_email(""));
    }
}
