use pulldown_cmark::{html, Event, Options, Parser};

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer. Raw HTML in the source is dropped so wiki bodies
/// cannot inject markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options).filter_map(|event| match event {
            Event::Html(_) | Event::InlineHtml(_) => None,
            other => Some(other),
        });

        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }
}
