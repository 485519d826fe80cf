//! Read portfolio sections out of a rendered HTML page.

use kb_core::collector::{ContentSource, Item, Link, Section};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An HTML page exposing the portfolio layout (`#home`, `#about`, `#projects`,
/// `#contact`) as a [`ContentSource`].
pub struct HtmlPage {
    doc: Html,
    base: Option<Url>,
}

impl HtmlPage {
    pub fn parse(html: &str, base: Option<Url>) -> Self {
        Self { doc: Html::parse_document(html), base }
    }

    fn first(&self, css: &str) -> Option<ElementRef<'_>> {
        self.doc.select(&selector(css)).next()
    }

    fn home(&self) -> Option<Section> {
        let hero = self.first("#home .hero-text")?;
        Some(Section { body: Some(inner_text(hero)), ..Default::default() })
    }

    fn about(&self) -> Option<Section> {
        let about = self.first("#about")?;
        let items = about
            .select(&selector(".skill"))
            .map(|skill| Item {
                title: child_text(skill, "h3"),
                body: child_text(skill, "p"),
                link: None,
            })
            .collect();
        Some(Section {
            title: child_text(about, "h2"),
            body: child_text(about, ".about-text"),
            items,
            links: Vec::new(),
        })
    }

    fn projects(&self) -> Option<Section> {
        let projects = self.first("#projects")?;
        let items = projects
            .select(&selector(".project-card"))
            .map(|card| Item {
                title: child_text(card, "h3"),
                body: child_text(card, "p"),
                link: card
                    .select(&selector("a"))
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
            })
            .collect();
        Some(Section { items, ..Default::default() })
    }

    fn contact(&self) -> Option<Section> {
        let contact = self.first("#contact")?;
        let links = contact
            .select(&selector(".social-links a"))
            .map(|a| Link {
                label: inner_text(a),
                href: a.value().attr("href").map(|h| self.resolve(h)),
            })
            .collect();
        Some(Section {
            title: child_text(contact, "h2"),
            body: child_text(contact, ".contact-intro"),
            items: Vec::new(),
            links,
        })
    }

    /// Absolute form of `href` against the page URL, when there is one.
    fn resolve(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

impl ContentSource for HtmlPage {
    fn section(&self, name: &str) -> Option<Section> {
        match name {
            "home" => self.home(),
            "about" => self.about(),
            "projects" => self.projects(),
            "contact" => self.contact(),
            _ => None,
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn child_text(el: ElementRef<'_>, css: &str) -> Option<String> {
    el.select(&selector(css)).next().map(inner_text)
}

/// Text content with whitespace runs collapsed, roughly what a browser renders.
fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}
