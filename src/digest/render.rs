use std::fmt::Write;

use crate::news::dto::Article;

/// Plain-text digest for chat delivery.
pub fn render_text(name: &str, articles: &[Article]) -> String {
    let mut out = format!(
        "Good Morning {name}!\nHere is your personalized news summary for today:\n\n"
    );
    for (index, article) in articles.iter().enumerate() {
        let _ = write!(
            out,
            "{}. *{}*\n{}\n{}\n\n",
            index + 1,
            article.title,
            article.summary,
            article.url
        );
    }
    out.push_str("Stay informed. Delivered by MeraPaper");
    out
}

/// HTML digest for email delivery.
pub fn render_html(name: &str, articles: &[Article]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div style=\"font-family: Arial, sans-serif; padding: 20px; color: #333; \
         max-width: 800px; margin: 0 auto;\">\
         <h2 style=\"color: #1a73e8;\">Good Morning {name}!</h2>\
         <p>Here is your personalized news summary for today:</p>"
    );
    for (index, article) in articles.iter().enumerate() {
        let _ = write!(
            out,
            "<div style=\"padding: 10px; border-bottom: 1px solid #ddd;\">\
             <h3 style=\"margin: 0 0 5px;\">{}. {}</h3>\
             <p style=\"color: #555; margin: 0 0 10px;\">{}</p>",
            index + 1,
            article.title,
            article.summary
        );
        if let Some(published_at) = &article.published_at {
            let _ = write!(
                out,
                "<p style=\"font-size: 12px; color: #777;\">{} | {} | {}</p>",
                published_at,
                article.country.as_str(),
                article.category.as_str()
            );
        }
        let _ = write!(
            out,
            "<a href=\"{}\" style=\"color: #1a73e8; font-weight: bold;\">Read more</a></div>",
            article.url
        );
    }
    out.push_str(
        "<hr style=\"border: 1px solid #ddd; margin: 20px 0;\">\
         <p style=\"font-size: 12px; color: #888; text-align: center;\">\
         Sent by MeraPaper · Stay Informed</p></div>",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::dto::{Category, Country};

    fn articles() -> Vec<Article> {
        vec![
            Article {
                title: "Monsoon arrives early".into(),
                summary: "Rains reached the coast a week ahead of schedule.".into(),
                url: "https://example.com/monsoon".into(),
                image_url: None,
                published_at: Some("2025-06-01 09:00:00".into()),
                source: Some("example".into()),
                category: Category::Top,
                country: Country::In,
            },
            Article {
                title: "Markets rally".into(),
                summary: "No summary available.".into(),
                url: "https://example.com/markets".into(),
                image_url: None,
                published_at: None,
                source: None,
                category: Category::Business,
                country: Country::In,
            },
        ]
    }

    #[test]
    fn text_digest_numbers_every_article() {
        let text = render_text("Asha", &articles());
        assert!(text.contains("Good Morning Asha!"));
        assert!(text.contains("1. *Monsoon arrives early*"));
        assert!(text.contains("2. *Markets rally*"));
        assert!(text.contains("https://example.com/monsoon"));
        assert!(text.contains("https://example.com/markets"));
    }

    #[test]
    fn html_digest_links_every_article() {
        let html = render_html("Asha", &articles());
        assert!(html.contains("<h2 style=\"color: #1a73e8;\">Good Morning Asha!</h2>"));
        assert!(html.contains("1. Monsoon arrives early"));
        assert!(html.contains("href=\"https://example.com/markets\""));
        // Publication line only rendered when the provider supplied a date.
        assert_eq!(html.matches("color: #777").count(), 1);
    }

    #[test]
    fn empty_digest_still_renders_greeting() {
        let text = render_text("Asha", &[]);
        assert!(text.starts_with("Good Morning Asha!"));
    }
}
