//! Terminal output for pull requests waiting for review

use std::io::{self, Write};

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use pullreminders_github::PullRequest;

/// First line of every listing
pub const HEADER: &str = "Pulls requesting a code review from you";

/// The roles text plays in the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Header,
    Number,
    Title,
    Branch,
    Url,
    Author,
}

impl Style {
    fn content_style(self) -> ContentStyle {
        let (color, attributes): (Color, &[Attribute]) = match self {
            Style::Header => (Color::White, &[Attribute::Bold]),
            Style::Number => (Color::Green, &[Attribute::Bold]),
            Style::Title => (Color::White, &[]),
            Style::Branch => (Color::Blue, &[]),
            Style::Url => (Color::White, &[Attribute::Underlined]),
            Style::Author => (Color::White, &[]),
        };

        ContentStyle {
            foreground_color: Some(color),
            attributes: Attributes::from(attributes),
            ..ContentStyle::default()
        }
    }
}

/// Apply `style` to `text`, or return it unchanged when color is off
pub fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        style.content_style().apply(text).to_string()
    } else {
        text.to_string()
    }
}

/// Writes pull request listings
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    color: bool,
}

impl Presenter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        paint(text, style, self.color)
    }

    /// Print the header, then one block per pull request in input order
    pub fn render<W: Write>(&self, out: &mut W, pulls: &[PullRequest]) -> io::Result<()> {
        writeln!(out, "{}\n", self.paint(HEADER, Style::Header))?;

        for pull in pulls {
            writeln!(
                out,
                "\t{} {} {}",
                self.paint(&format!("#{}", pull.number), Style::Number),
                self.paint(&pull.title, Style::Title),
                self.paint(&format!("[{}]", pull.branch), Style::Branch),
            )?;
            writeln!(out, "\t\t{}", self.paint(&pull.url, Style::Url))?;
            writeln!(
                out,
                "\t\t{}\n",
                self.paint(&format!("@{}", pull.author), Style::Author)
            )?;
        }

        out.flush()
    }
}
