//! Markdown rendering of site pages.
//!
//! Listings render as a heading followed by one card per record, shaped by
//! the collection:
//!
//! - **Articles**: linked title, then section, author link and short date
//! - **Newsletters**: title, long date, summary, link to the newsletter
//! - **Print issues**: title, issue number and month, link to the PDF
//! - **Team members**: name, role, bio, social link
//!
//! Missing fields simply drop the line or fragment that would show them.
//! Article pages render in full; an unknown id renders the "not found" page.

use itertools::Itertools;
use std::fmt::Write;

use crate::models::{Article, Collection, Newsletter, PrintIssue, Record, TeamMember};
use crate::outputs::{DetailSnapshot, ListingSnapshot, RenderedPage};
use crate::utils::{DateStyle, format_date};
use crate::views::{DetailState, author_path};

const BACK_TO_ARTICLES: &str = "[← Back to Articles](/news)";

/// Render several pages, separated by horizontal rules.
pub fn render_pages(pages: &[RenderedPage]) -> String {
    pages
        .iter()
        .map(|page| match page {
            RenderedPage::Listing(listing) => listing_to_markdown(listing),
            RenderedPage::Detail(detail) => detail_to_markdown(detail),
        })
        .join("\n---\n\n")
}

pub fn listing_to_markdown(listing: &ListingSnapshot) -> String {
    let mut md = String::new();

    if let Some(from) = &listing.redirected_from {
        writeln!(md, "<!-- {from} redirected to {} -->", listing.path).unwrap();
    }
    writeln!(md, "# {}\n", listing.heading).unwrap();

    if let Some(author) = &listing.author {
        let n = listing.records.len();
        let noun = if n == 1 { "article" } else { "articles" };
        writeln!(md, "_{n} {noun} published by {author}_\n").unwrap();
    }

    if listing.records.is_empty() && listing.error.is_none() {
        writeln!(md, "{}\n", listing.empty_message).unwrap();
    }

    for record in &listing.records {
        let card = match listing.collection {
            Collection::Articles => article_card(&Article::from(record)),
            Collection::Newsletters => newsletter_card(&Newsletter::from(record)),
            Collection::PrintIssues => print_issue_card(&PrintIssue::from(record)),
            Collection::TeamMembers => team_member_card(&TeamMember::from(record)),
        };
        md.push_str(&card);
        md.push('\n');
    }

    if let Some(error) = &listing.error {
        if listing.records.is_empty() {
            writeln!(md, "> Could not load {}: {error}\n", listing.heading).unwrap();
        } else {
            writeln!(md, "> Could not load more: {error}\n").unwrap();
        }
    }

    if listing.can_load_more {
        writeln!(
            md,
            "_{}: more available from offset {}_",
            listing.load_more_label, listing.next_offset
        )
        .unwrap();
    }

    md
}

pub fn detail_to_markdown(detail: &DetailSnapshot) -> String {
    let mut md = String::new();
    match &detail.state {
        DetailState::Found(record) => md.push_str(&article_page(record)),
        DetailState::NotFound => {
            writeln!(md, "## Article Not Found\n").unwrap();
            writeln!(md, "The article you're looking for doesn't exist.\n").unwrap();
            writeln!(md, "{BACK_TO_ARTICLES}").unwrap();
        }
        DetailState::Failed(error) => {
            writeln!(md, "## Could Not Load Article\n").unwrap();
            writeln!(md, "> {error}\n").unwrap();
            writeln!(md, "{BACK_TO_ARTICLES}").unwrap();
        }
    }
    md
}

fn title_or_untitled(title: Option<&String>) -> &str {
    title.map_or("Untitled", String::as_str)
}

fn article_card(article: &Article) -> String {
    let mut md = String::new();
    writeln!(
        md,
        "### [{}](/article/{})",
        title_or_untitled(article.title.as_ref()),
        urlencoding::encode(&article.id)
    )
    .unwrap();

    let meta = [
        article.section_category.as_ref().map(|s| s.to_uppercase()),
        article
            .author_name
            .as_ref()
            .map(|a| format!("[{a}]({})", author_path(a))),
        article
            .publication_date
            .as_deref()
            .and_then(|d| format_date(d, DateStyle::Short)),
    ]
    .into_iter()
    .flatten()
    .join(" · ");
    if !meta.is_empty() {
        writeln!(md, "{meta}").unwrap();
    }
    md
}

fn article_page(record: &Record) -> String {
    let article = Article::from(record);
    let mut md = String::new();

    writeln!(md, "# {}\n", title_or_untitled(article.title.as_ref())).unwrap();

    let meta = [
        article.section_category.as_ref().map(|s| s.to_uppercase()),
        article
            .author_name
            .as_ref()
            .map(|a| format!("By [{a}]({})", author_path(a))),
        article
            .publication_date
            .as_deref()
            .and_then(|d| format_date(d, DateStyle::Long)),
    ]
    .into_iter()
    .flatten()
    .join(" · ");
    if !meta.is_empty() {
        writeln!(md, "{meta}\n").unwrap();
    }

    if let Some(image) = &article.featured_image {
        writeln!(md, "![{}]({image})\n", title_or_untitled(article.title.as_ref())).unwrap();
    }
    if let Some(content) = &article.full_content {
        writeln!(md, "{}\n", content.trim_end()).unwrap();
    }
    writeln!(md, "{BACK_TO_ARTICLES}").unwrap();
    md
}

fn newsletter_card(newsletter: &Newsletter) -> String {
    let mut md = String::new();
    writeln!(md, "### {}", title_or_untitled(newsletter.title.as_ref())).unwrap();
    if let Some(date) = newsletter
        .date_sent
        .as_deref()
        .and_then(|d| format_date(d, DateStyle::Long))
    {
        writeln!(md, "{date}").unwrap();
    }
    if let Some(summary) = &newsletter.summary {
        writeln!(md, "\n{summary}").unwrap();
    }
    if let Some(link) = &newsletter.link {
        writeln!(md, "\n[Read Newsletter]({link})").unwrap();
    }
    md
}

fn print_issue_card(issue: &PrintIssue) -> String {
    let mut md = String::new();
    writeln!(md, "### {}", title_or_untitled(issue.title.as_ref())).unwrap();
    let meta = [
        issue.issue_number.map(|n| format!("Issue #{n}")),
        issue
            .publication_date
            .as_deref()
            .and_then(|d| format_date(d, DateStyle::MonthYear)),
    ]
    .into_iter()
    .flatten()
    .join(" · ");
    if !meta.is_empty() {
        writeln!(md, "{meta}").unwrap();
    }
    if let Some(link) = &issue.pdf_link {
        writeln!(md, "\n[View PDF]({link})").unwrap();
    }
    md
}

fn team_member_card(member: &TeamMember) -> String {
    let mut md = String::new();
    writeln!(md, "### {}", member.name.as_deref().unwrap_or("Staff")).unwrap();
    if let Some(role) = &member.role {
        writeln!(md, "*{role}*").unwrap();
    }
    if let Some(bio) = &member.bio {
        writeln!(md, "\n{bio}").unwrap();
    }
    if let Some(link) = &member.social_link {
        writeln!(md, "\n[Connect]({link})").unwrap();
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(collection: Collection, records: Vec<Record>) -> ListingSnapshot {
        ListingSnapshot {
            path: "/news".to_string(),
            redirected_from: None,
            heading: "News".to_string(),
            collection,
            filter: None,
            records,
            has_more: false,
            can_load_more: false,
            next_offset: 12,
            error: None,
            empty_message: "No articles found in this section.",
            load_more_label: "Load More Articles",
            author: None,
        }
    }

    #[test]
    fn test_article_card() {
        let record = Record::new("a-1")
            .with("articleTitle", "Quad renovation delayed")
            .with("sectionCategory", "News")
            .with("authorName", "Sam Ortiz")
            .with("publicationDate", "2025-03-04T15:00:00Z");
        let md = listing_to_markdown(&listing(Collection::Articles, vec![record]));

        assert!(md.starts_with("# News\n"));
        assert!(md.contains("### [Quad renovation delayed](/article/a-1)"));
        assert!(md.contains("NEWS · [Sam Ortiz](/author/Sam%20Ortiz) · Mar 4, 2025"));
    }

    #[test]
    fn test_article_card_without_optional_fields() {
        let md = listing_to_markdown(&listing(Collection::Articles, vec![Record::new("a-2")]));
        assert!(md.contains("### [Untitled](/article/a-2)\n"));
        assert!(!md.contains(" · "));
    }

    #[test]
    fn test_empty_listing_shows_empty_message() {
        let md = listing_to_markdown(&listing(Collection::Articles, vec![]));
        assert!(md.contains("No articles found in this section."));
    }

    #[test]
    fn test_load_more_and_error_notes() {
        let mut snapshot = listing(Collection::Newsletters, vec![Record::new("n-1")]);
        snapshot.can_load_more = true;
        snapshot.load_more_label = "Load More Newsletters";
        snapshot.error = Some("failed to fetch from newsletters: timeout".to_string());

        let md = listing_to_markdown(&snapshot);
        assert!(md.contains("> Could not load more: failed to fetch from newsletters: timeout"));
        assert!(md.contains("_Load More Newsletters: more available from offset 12_"));
        assert!(!md.contains("No articles found"));
    }

    #[test]
    fn test_first_load_failure_note() {
        let mut snapshot = listing(Collection::Articles, vec![]);
        snapshot.error = Some("failed to fetch from articles: connection refused".to_string());

        let md = listing_to_markdown(&snapshot);
        assert!(md.contains("> Could not load News: failed to fetch from articles: connection refused"));
        assert!(!md.contains("Could not load more"));
        assert!(!md.contains("No articles found"));
    }

    #[test]
    fn test_author_count_line() {
        let mut snapshot = listing(Collection::Articles, vec![Record::new("a-1")]);
        snapshot.author = Some("Sam Ortiz".to_string());
        let md = listing_to_markdown(&snapshot);
        assert!(md.contains("_1 article published by Sam Ortiz_"));
    }

    #[test]
    fn test_print_issue_and_team_cards() {
        let issue = Record::new("p-1")
            .with("issueTitle", "Winter Edition")
            .with("issueNumber", 17)
            .with("publicationDate", "2025-01-15")
            .with("pdfLink", "https://cdn.example.edu/w.pdf");
        let md = listing_to_markdown(&listing(Collection::PrintIssues, vec![issue]));
        assert!(md.contains("Issue #17 · January 2025"));
        assert!(md.contains("[View PDF](https://cdn.example.edu/w.pdf)"));

        let member = Record::new("t-1").with("name", "Ada Park").with("role", "Editor");
        let md = listing_to_markdown(&listing(Collection::TeamMembers, vec![member]));
        assert!(md.contains("### Ada Park\n*Editor*"));
    }

    #[test]
    fn test_detail_not_found() {
        let snapshot = DetailSnapshot {
            path: "/article/missing-id".to_string(),
            collection: Collection::Articles,
            id: "missing-id".to_string(),
            state: DetailState::NotFound,
        };
        let md = detail_to_markdown(&snapshot);
        assert!(md.starts_with("## Article Not Found"));
        assert!(md.contains(BACK_TO_ARTICLES));
    }

    #[test]
    fn test_detail_found() {
        let record = Record::new("a-1")
            .with("articleTitle", "Quad renovation delayed")
            .with("authorName", "Sam Ortiz")
            .with("publicationDate", "2025-03-04")
            .with("fullContent", "The project slips to fall.\n\nMore soon.\n");
        let snapshot = DetailSnapshot {
            path: "/article/a-1".to_string(),
            collection: Collection::Articles,
            id: "a-1".to_string(),
            state: DetailState::Found(record),
        };
        let md = detail_to_markdown(&snapshot);
        assert!(md.starts_with("# Quad renovation delayed\n"));
        assert!(md.contains("By [Sam Ortiz](/author/Sam%20Ortiz) · March 4, 2025"));
        assert!(md.contains("The project slips to fall.\n\nMore soon.\n"));
    }
}
